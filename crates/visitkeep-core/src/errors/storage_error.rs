/// Storage-layer errors shared by every record store backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("record serialization failed: {message}")]
    Serialization { message: String },

    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("timed out after {waited_ms}ms waiting for the lock on session {token_prefix}")]
    LockTimeout { token_prefix: String, waited_ms: u64 },

    #[error("update abandoned after {attempts} conflicting attempts")]
    Contention { attempts: u32 },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },
}
