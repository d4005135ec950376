use crate::errors::SessionResult;
use crate::models::SessionToken;

/// Source of fresh, unguessable session tokens.
pub trait ITokenGenerator: Send + Sync {
    /// Fails with `EntropyUnavailable` when the random source cannot be read.
    fn generate(&self) -> SessionResult<SessionToken>;
}
