use chrono::{DateTime, Utc};

use crate::errors::SessionResult;
use crate::models::{RecordTransition, SessionRecord, SessionToken};

/// Durable per-token record storage with an atomic read-modify-write cycle.
///
/// `update` calls on the same token never interleave. Calls on different
/// tokens never wait on each other.
pub trait ISessionStore: Send + Sync {
    /// Stored record, or `SessionRecord::default()` when none exists.
    fn load(&self, token: &SessionToken) -> SessionResult<SessionRecord>;

    /// Replace the stored record.
    fn save(&self, token: &SessionToken, record: &SessionRecord) -> SessionResult<()>;

    /// Load, mutate, and persist one record as a single critical section.
    ///
    /// `mutate` may run more than once on backends that retry; each run
    /// receives a fresh copy of the stored record.
    fn update(
        &self,
        token: &SessionToken,
        mutate: &mut dyn FnMut(&mut SessionRecord),
    ) -> SessionResult<RecordTransition>;

    /// Delete one record. Returns false if it did not exist.
    fn remove(&self, token: &SessionToken) -> SessionResult<bool>;

    /// Delete every record whose last visit is older than `cutoff`.
    fn purge_idle(&self, cutoff: DateTime<Utc>) -> SessionResult<usize>;
}
