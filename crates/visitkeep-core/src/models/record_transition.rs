use super::SessionRecord;

/// Outcome of one atomic read-modify-write on a session record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTransition {
    /// Record as it was stored before the mutation (default if missing).
    pub before: SessionRecord,
    /// Record as persisted after the mutation.
    pub after: SessionRecord,
    /// True when no record existed for the token.
    pub created: bool,
}
