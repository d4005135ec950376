use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::ConfigError;

/// Which record store implementation to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One JSON file per token.
    #[default]
    File,
    /// Embedded SQLite database.
    Sqlite,
    /// In-process map. Not durable.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::ValidationFailed {
                field: "store.backend".to_string(),
                message: format!("unknown backend '{other}' (expected file, sqlite, or memory)"),
            }),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        })
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Directory holding record files or the database. Relative paths are
    /// joined to the project root; unset falls back to `$DOCUMENT_ROOT/tmp`.
    pub dir: Option<PathBuf>,
    /// Database file name inside `dir` (sqlite backend).
    pub db_filename: String,
    /// Maximum wait for a per-token lock (file backend).
    pub lock_timeout_ms: u64,
    /// SQLite busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Write transaction attempts before giving up (sqlite backend).
    pub max_write_attempts: u32,
    /// Number of pooled SQLite connections.
    pub pool_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            dir: None,
            db_filename: defaults::DEFAULT_DB_FILENAME.to_string(),
            lock_timeout_ms: defaults::DEFAULT_LOCK_TIMEOUT_MS,
            busy_timeout_ms: defaults::DEFAULT_BUSY_TIMEOUT_MS,
            max_write_attempts: defaults::DEFAULT_MAX_WRITE_ATTEMPTS,
            pool_size: defaults::DEFAULT_POOL_SIZE,
        }
    }
}

impl StoreConfig {
    /// Resolve the storage directory.
    ///
    /// Explicit `dir` (joined to `root` when relative), then
    /// `<document_root>/tmp`, then `<root>/tmp`.
    pub fn resolve_dir(&self, root: &Path, document_root: Option<&Path>) -> PathBuf {
        match (&self.dir, document_root) {
            (Some(dir), _) if dir.is_absolute() => dir.clone(),
            (Some(dir), _) => root.join(dir),
            (None, Some(doc_root)) => doc_root.join(defaults::DEFAULT_STORE_SUBDIR),
            (None, None) => root.join(defaults::DEFAULT_STORE_SUBDIR),
        }
    }
}
