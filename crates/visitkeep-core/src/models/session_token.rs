//! SessionToken: opaque, fixed-length identifier for one session record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{TOKEN_BYTES, TOKEN_LEN, TOKEN_LOG_PREFIX_LEN};
use crate::errors::{SessionError, SessionResult};

/// A session token: `TOKEN_LEN` lowercase hex characters.
///
/// Only constructible through [`SessionToken::parse`] or
/// [`SessionToken::from_entropy`], so every value is safe to embed in a
/// file name or SQL parameter. `Debug` prints only a short prefix.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

impl SessionToken {
    /// Parse a token presented by a client.
    pub fn parse(raw: &str) -> SessionResult<Self> {
        if raw.len() != TOKEN_LEN {
            return Err(SessionError::MalformedToken {
                reason: format!("expected {TOKEN_LEN} characters, got {}", raw.len()),
            });
        }
        if !raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(SessionError::MalformedToken {
                reason: "token must be lowercase hex".to_string(),
            });
        }
        Ok(Self(raw.to_string()))
    }

    /// Build a token from freshly drawn random bytes.
    pub fn from_entropy(bytes: [u8; TOKEN_BYTES]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix that is safe to log.
    pub fn log_prefix(&self) -> &str {
        &self.0[..TOKEN_LOG_PREFIX_LEN]
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({}…)", self.log_prefix())
    }
}

impl FromStr for SessionToken {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionToken {
    type Error = SessionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
