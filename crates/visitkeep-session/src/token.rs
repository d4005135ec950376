//! OsTokenGenerator: session tokens from the operating system CSPRNG.

use visitkeep_core::constants::TOKEN_BYTES;
use visitkeep_core::errors::{SessionError, SessionResult};
use visitkeep_core::{ITokenGenerator, SessionToken};

/// Draws `TOKEN_BYTES` (256 bits) from the OS random source per token.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsTokenGenerator;

impl ITokenGenerator for OsTokenGenerator {
    fn generate(&self) -> SessionResult<SessionToken> {
        let mut bytes = [0u8; TOKEN_BYTES];
        getrandom::fill(&mut bytes).map_err(|e| SessionError::EntropyUnavailable {
            reason: e.to_string(),
        })?;
        let token = SessionToken::from_entropy(bytes);
        tracing::debug!(token = token.log_prefix(), "session token issued");
        Ok(token)
    }
}
