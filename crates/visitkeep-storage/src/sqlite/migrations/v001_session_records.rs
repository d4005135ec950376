//! v001: session_records.

use rusqlite::Connection;

use visitkeep_core::errors::SessionResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> SessionResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS session_records (
            token       TEXT PRIMARY KEY,
            last_visit  TEXT,
            visit_count INTEGER NOT NULL DEFAULT 0 CHECK (visit_count >= 0),
            metadata    TEXT NOT NULL DEFAULT '{}',
            updated_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_session_records_last_visit
            ON session_records(last_visit);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
