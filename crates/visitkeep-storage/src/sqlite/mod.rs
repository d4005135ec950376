//! SqliteSessionStore: session records in an embedded SQLite database.
//!
//! Every read-modify-write runs in a `BEGIN IMMEDIATE` transaction, so the
//! database's single writer lock is the critical section. Busy failures are
//! retried up to `max_write_attempts` times, then surface as
//! `StorageError::Contention`.

pub mod migrations;
pub mod pool;
pub mod pragmas;
pub mod queries;

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{ErrorCode, TransactionBehavior};
use tracing::{debug, info, warn};

use visitkeep_core::config::StoreConfig;
use visitkeep_core::errors::{SessionResult, StorageError};
use visitkeep_core::{ISessionStore, RecordTransition, SessionRecord, SessionToken};

use crate::file::record_io;
use crate::to_storage_err;
use pool::ConnectionPool;

/// SQLite-backed session store.
pub struct SqliteSessionStore {
    pool: ConnectionPool,
    max_write_attempts: u32,
}

impl SqliteSessionStore {
    /// Open (or create) the database at `path` and run migrations.
    pub fn open(path: &Path, config: &StoreConfig) -> SessionResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            record_io::ensure_dir(parent)?;
        }
        // Sidecars inherit the main file's mode, so it must exist as 0600 first.
        record_io::owner_only()
            .open(path)
            .map_err(|e| crate::io_err(path, e))?;
        let pool = ConnectionPool::open(path, config.pool_size, config.busy_timeout_ms)?;
        restrict_permissions(path)?;
        Self::initialize(pool, config.max_write_attempts)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory(config: &StoreConfig) -> SessionResult<Self> {
        let pool = ConnectionPool::open_in_memory(config.busy_timeout_ms)?;
        Self::initialize(pool, config.max_write_attempts)
    }

    fn initialize(pool: ConnectionPool, max_write_attempts: u32) -> SessionResult<Self> {
        pool.with_conn(migrations::run_migrations)?;
        Ok(Self {
            pool,
            max_write_attempts: max_write_attempts.max(1),
        })
    }

    /// Get a reference to the connection pool (for advanced operations).
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Total stored records.
    pub fn count(&self) -> SessionResult<usize> {
        self.pool.with_conn(|conn| queries::count_records(conn))
    }

    /// One transactional attempt. `Ok(None)` when the write lock was busy.
    fn try_update(
        &self,
        token: &SessionToken,
        mutate: &mut dyn FnMut(&mut SessionRecord),
    ) -> SessionResult<Option<RecordTransition>> {
        self.pool.with_conn(|conn| {
            let tx = match conn.transaction_with_behavior(TransactionBehavior::Immediate) {
                Ok(tx) => tx,
                Err(e) if is_busy(&e) => return Ok(None),
                Err(e) => return Err(to_storage_err(e.to_string())),
            };

            let stored = queries::get_record(&tx, token)?;
            let created = stored.is_none();
            let before = stored.unwrap_or_default();
            let mut after = before.clone();
            mutate(&mut after);
            queries::upsert_record(&tx, token, &after)?;

            match tx.commit() {
                Ok(()) => Ok(Some(RecordTransition {
                    before,
                    after,
                    created,
                })),
                Err(e) if is_busy(&e) => Ok(None),
                Err(e) => Err(to_storage_err(e.to_string())),
            }
        })
    }
}

impl ISessionStore for SqliteSessionStore {
    fn load(&self, token: &SessionToken) -> SessionResult<SessionRecord> {
        self.pool
            .with_conn(|conn| queries::get_record(conn, token))
            .map(Option::unwrap_or_default)
    }

    fn save(&self, token: &SessionToken, record: &SessionRecord) -> SessionResult<()> {
        self.pool
            .with_conn(|conn| queries::upsert_record(conn, token, record))
    }

    fn update(
        &self,
        token: &SessionToken,
        mutate: &mut dyn FnMut(&mut SessionRecord),
    ) -> SessionResult<RecordTransition> {
        for attempt in 1..=self.max_write_attempts {
            if let Some(transition) = self.try_update(token, mutate)? {
                debug!(
                    token = token.log_prefix(),
                    attempt,
                    created = transition.created,
                    visit_count = transition.after.visit_count,
                    "session record updated"
                );
                return Ok(transition);
            }
            warn!(token = token.log_prefix(), attempt, "session database busy; retrying");
        }
        Err(StorageError::Contention {
            attempts: self.max_write_attempts,
        }
        .into())
    }

    fn remove(&self, token: &SessionToken) -> SessionResult<bool> {
        self.pool
            .with_conn(|conn| queries::delete_record(conn, token))
    }

    fn purge_idle(&self, cutoff: DateTime<Utc>) -> SessionResult<usize> {
        let purged = self
            .pool
            .with_conn(|conn| queries::delete_idle(conn, cutoff))?;
        info!(purged, cutoff = %cutoff, "idle sessions purged");
        Ok(purged)
    }
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

/// Database, `-wal` and `-shm` files are owner-only, including files left
/// behind with wider modes.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> SessionResult<()> {
    use std::os::unix::fs::PermissionsExt;

    for file in database_files(path) {
        match std::fs::set_permissions(
            &file,
            std::fs::Permissions::from_mode(record_io::FILE_MODE),
        ) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(crate::io_err(&file, e)),
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> SessionResult<()> {
    Ok(())
}

#[cfg(unix)]
fn database_files(path: &Path) -> [std::path::PathBuf; 3] {
    let sidecar = |suffix: &str| {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        std::path::PathBuf::from(name)
    };
    [path.to_path_buf(), sidecar("-wal"), sidecar("-shm")]
}
