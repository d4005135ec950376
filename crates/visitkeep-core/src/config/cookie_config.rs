use serde::{Deserialize, Serialize};

use super::defaults;

/// `SameSite` attribute emitted on the session cookie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    #[default]
    Strict,
    Lax,
    None,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie field carrying the token.
    pub name: String,
    /// `Max-Age` in seconds.
    pub max_age_secs: i64,
    pub http_only: bool,
    pub same_site: SameSitePolicy,
    pub secure: bool,
    /// Optional `Path` attribute.
    pub path: Option<String>,
    /// Re-emit `Set-Cookie` on every visit (sliding expiry).
    pub refresh_on_visit: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: defaults::DEFAULT_COOKIE_NAME.to_string(),
            max_age_secs: defaults::DEFAULT_COOKIE_MAX_AGE_SECS,
            http_only: defaults::DEFAULT_COOKIE_HTTP_ONLY,
            same_site: SameSitePolicy::default(),
            secure: defaults::DEFAULT_COOKIE_SECURE,
            path: None,
            refresh_on_visit: defaults::DEFAULT_REFRESH_ON_VISIT,
        }
    }
}
