//! Schema migrations tracked through `PRAGMA user_version`.

mod v001_session_records;

use rusqlite::{Connection, TransactionBehavior};

use visitkeep_core::errors::{SessionError, SessionResult, StorageError};

use crate::to_storage_err;

type Migration = fn(&Connection) -> SessionResult<()>;

const MIGRATIONS: &[(u32, Migration)] = &[(1, v001_session_records::migrate)];

/// Latest schema version.
pub const LATEST_VERSION: u32 = 1;

/// Apply pending migrations inside one immediate transaction, so concurrent
/// openers of the same database run them once.
pub fn run_migrations(conn: &mut Connection) -> SessionResult<()> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| to_storage_err(e.to_string()))?;

    let current = current_version(&tx)?;
    for &(version, migrate) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        migrate(&tx).map_err(|e| {
            SessionError::StorageUnavailable(StorageError::MigrationFailed {
                version,
                reason: e.to_string(),
            })
        })?;
        tx.pragma_update(None, "user_version", version)
            .map_err(|e| to_storage_err(e.to_string()))?;
        tracing::info!(version, "session schema migrated");
    }

    tx.commit().map_err(|e| to_storage_err(e.to_string()))
}

/// Schema version recorded in the database.
pub fn current_version(conn: &Connection) -> SessionResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))
}
