//! # visitkeep-storage
//!
//! Session record stores implementing [`ISessionStore`]:
//! - [`FileSessionStore`]: one JSON file per token, per-token advisory lock.
//! - [`SqliteSessionStore`]: embedded SQLite, single-writer transactions.
//! - [`MemorySessionStore`]: in-process map, not durable.

pub mod file;
pub mod memory;
pub mod sqlite;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use visitkeep_core::config::{StoreBackend, StoreConfig};
use visitkeep_core::errors::{SessionError, SessionResult, StorageError};
use visitkeep_core::ISessionStore;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

/// Open the backend selected by `config`, rooted at `dir`.
pub fn open_store(config: &StoreConfig, dir: &Path) -> SessionResult<Arc<dyn ISessionStore>> {
    let store: Arc<dyn ISessionStore> = match config.backend {
        StoreBackend::File => Arc::new(FileSessionStore::open(
            dir,
            Duration::from_millis(config.lock_timeout_ms),
        )?),
        StoreBackend::Sqlite => Arc::new(SqliteSessionStore::open(&dir.join(&config.db_filename), config)?),
        StoreBackend::Memory => Arc::new(MemorySessionStore::new()),
    };
    tracing::debug!(backend = %config.backend, dir = %dir.display(), "session store opened");
    Ok(store)
}

/// Wrap a SQLite failure.
pub(crate) fn to_storage_err(message: impl Into<String>) -> SessionError {
    SessionError::StorageUnavailable(StorageError::Sqlite {
        message: message.into(),
    })
}

/// Wrap an I/O failure on `path`.
pub(crate) fn io_err(path: &Path, err: std::io::Error) -> SessionError {
    SessionError::StorageUnavailable(StorageError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

/// Wrap a record (de)serialization failure.
pub(crate) fn serde_err(err: impl std::fmt::Display) -> SessionError {
    SessionError::StorageUnavailable(StorageError::Serialization {
        message: err.to_string(),
    })
}
