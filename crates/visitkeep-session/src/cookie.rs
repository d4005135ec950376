//! Cookie binding: reads the session token from a `Cookie` header and builds
//! the `Set-Cookie` value that binds a token to the client.
//!
//! Pure translation. Nothing here touches storage.

use cookie::time::Duration;
use cookie::{Cookie, SameSite};

use visitkeep_core::config::{CookieConfig, SameSitePolicy};
use visitkeep_core::SessionToken;

/// What the caller should do with the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieInstruction {
    /// The presented token is already bound. Emit nothing.
    Keep,
    /// Emit `Set-Cookie` with this value.
    Set(String),
}

impl CookieInstruction {
    /// The `Set-Cookie` header value, if one must be emitted.
    pub fn set_cookie(&self) -> Option<&str> {
        match self {
            Self::Keep => None,
            Self::Set(value) => Some(value),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }
}

/// Translates between request cookies and session tokens.
#[derive(Debug, Clone)]
pub struct CookieBinding {
    name: String,
    max_age: Duration,
    http_only: bool,
    same_site: SameSite,
    secure: bool,
    path: Option<String>,
    refresh_on_visit: bool,
}

impl CookieBinding {
    pub fn from_config(config: &CookieConfig) -> Self {
        Self {
            name: config.name.clone(),
            max_age: Duration::seconds(config.max_age_secs),
            http_only: config.http_only,
            same_site: match config.same_site {
                SameSitePolicy::Strict => SameSite::Strict,
                SameSitePolicy::Lax => SameSite::Lax,
                SameSitePolicy::None => SameSite::None,
            },
            secure: config.secure,
            path: config.path.clone(),
            refresh_on_visit: config.refresh_on_visit,
        }
    }

    /// Cookie field carrying the token.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token from a `Cookie` header value.
    ///
    /// Absent header, missing cookie, empty value and malformed tokens all
    /// yield `None`. The first cookie with the configured name wins.
    pub fn extract(&self, header: Option<&str>) -> Option<SessionToken> {
        let header = header?;
        let value = Cookie::split_parse(header)
            .filter_map(Result::ok)
            .find(|c| c.name() == self.name)
            .map(|c| c.value().trim().to_string())?;
        if value.is_empty() {
            return None;
        }
        match SessionToken::parse(&value) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::debug!(cookie = %self.name, error = %e, "ignoring presented session token");
                None
            }
        }
    }

    /// Instruction that binds `token` to the client.
    pub fn bind(&self, token: &SessionToken) -> CookieInstruction {
        let mut builder = Cookie::build((self.name.clone(), token.to_string()))
            .http_only(self.http_only)
            .same_site(self.same_site)
            .max_age(self.max_age);
        if self.secure {
            builder = builder.secure(true);
        }
        if let Some(path) = &self.path {
            builder = builder.path(path.clone());
        }
        CookieInstruction::Set(builder.build().to_string())
    }

    /// `Set` for a freshly issued token (or always, with refresh enabled);
    /// `Keep` for a token the client already holds.
    pub fn instruction_for(&self, token: &SessionToken, freshly_issued: bool) -> CookieInstruction {
        if freshly_issued || self.refresh_on_visit {
            self.bind(token)
        } else {
            CookieInstruction::Keep
        }
    }
}

impl Default for CookieBinding {
    fn default() -> Self {
        Self::from_config(&CookieConfig::default())
    }
}
