//! Top-level visitkeep configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{defaults, CookieConfig, RetentionConfig, StoreConfig};
use crate::constants::{MAX_WRITE_ATTEMPTS, PROJECT_CONFIG_FILENAME};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`VISITKEEP_*`)
/// 2. Project config (`visitkeep.toml` in the root)
/// 3. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VisitkeepConfig {
    pub store: StoreConfig,
    pub cookie: CookieConfig,
    pub retention: RetentionConfig,
}

impl VisitkeepConfig {
    /// Load configuration for the project rooted at `root`.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project_config_path = root.join(PROJECT_CONFIG_FILENAME);
        if project_config_path.exists() {
            config = Self::from_file(&project_config_path)?;
        }

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Apply `VISITKEEP_*` overrides. `lookup` abstracts the environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("VISITKEEP_STORE_BACKEND") {
            self.store.backend = backend.parse()?;
        }
        if let Some(dir) = lookup("VISITKEEP_STORE_DIR") {
            if !dir.trim().is_empty() {
                self.store.dir = Some(PathBuf::from(dir));
            }
        }
        if let Some(name) = lookup("VISITKEEP_COOKIE_NAME") {
            self.cookie.name = name;
        }
        if let Some(ms) = lookup("VISITKEEP_LOCK_TIMEOUT_MS") {
            self.store.lock_timeout_ms =
                ms.trim().parse().map_err(|_| ConfigError::ValidationFailed {
                    field: "store.lock_timeout_ms".to_string(),
                    message: format!("'{ms}' is not a whole number of milliseconds"),
                })?;
        }
        Ok(())
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_WRITE_ATTEMPTS).contains(&self.store.max_write_attempts) {
            return Err(invalid(
                "store.max_write_attempts",
                format!("must be between 1 and {MAX_WRITE_ATTEMPTS}"),
            ));
        }
        if self.store.lock_timeout_ms == 0 {
            return Err(invalid("store.lock_timeout_ms", "must be greater than 0"));
        }
        if !(1..=defaults::MAX_POOL_SIZE).contains(&self.store.pool_size) {
            return Err(invalid(
                "store.pool_size",
                format!("must be between 1 and {}", defaults::MAX_POOL_SIZE),
            ));
        }
        if self.store.db_filename.trim().is_empty() {
            return Err(invalid("store.db_filename", "must not be empty"));
        }
        if self.cookie.max_age_secs <= 0 {
            return Err(invalid("cookie.max_age_secs", "must be greater than 0"));
        }
        if self.cookie.name.is_empty() || !self.cookie.name.bytes().all(is_cookie_token_byte) {
            return Err(invalid(
                "cookie.name",
                "must be a non-empty RFC 6265 token (no spaces, separators, or controls)",
            ));
        }
        if self.retention.idle_secs == 0 {
            return Err(invalid("retention.idle_secs", "must be greater than 0"));
        }
        Ok(())
    }

    /// Storage directory for this project. See [`StoreConfig::resolve_dir`].
    pub fn store_dir(&self, root: &Path, document_root: Option<&Path>) -> PathBuf {
        self.store.resolve_dir(root, document_root)
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.into(),
    }
}

fn is_cookie_token_byte(b: u8) -> bool {
    b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
}
