use super::{ConfigError, StorageError};

/// Top-level error returned by every public visitkeep operation.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The OS random source could not be read. No session can be issued.
    #[error("entropy unavailable: {reason}")]
    EntropyUnavailable { reason: String },

    /// The record store failed. Callers may still serve an untracked response.
    #[error("session storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    /// A presented token failed to parse. Treated as "no token" by the manager.
    #[error("malformed session token: {reason}")]
    MalformedToken { reason: String },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SessionError {
    /// Whether a request handler can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::StorageUnavailable(_) | SessionError::MalformedToken { .. }
        )
    }
}

/// Convenience alias.
pub type SessionResult<T> = Result<T, SessionError>;
