use chrono::{DateTime, Utc};

use visitkeep_core::errors::{SessionResult, StorageError};
use visitkeep_core::{ISessionStore, RecordTransition, SessionRecord, SessionToken};

/// Stand-in for a store that failed to open. Every call reports the open
/// failure unchanged, so the manager serves degraded visits.
pub struct OfflineStore {
    cause: StorageError,
}

impl OfflineStore {
    pub fn new(cause: StorageError) -> Self {
        Self { cause }
    }

    fn fail<T>(&self) -> SessionResult<T> {
        Err(self.cause.clone().into())
    }
}

impl ISessionStore for OfflineStore {
    fn load(&self, _token: &SessionToken) -> SessionResult<SessionRecord> {
        self.fail()
    }

    fn save(&self, _token: &SessionToken, _record: &SessionRecord) -> SessionResult<()> {
        self.fail()
    }

    fn update(
        &self,
        _token: &SessionToken,
        _mutate: &mut dyn FnMut(&mut SessionRecord),
    ) -> SessionResult<RecordTransition> {
        self.fail()
    }

    fn remove(&self, _token: &SessionToken) -> SessionResult<bool> {
        self.fail()
    }

    fn purge_idle(&self, _cutoff: DateTime<Utc>) -> SessionResult<usize> {
        self.fail()
    }
}
