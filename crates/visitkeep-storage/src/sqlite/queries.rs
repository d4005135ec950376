//! Session record CRUD.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use visitkeep_core::errors::SessionResult;
use visitkeep_core::{SessionRecord, SessionToken};

use crate::{serde_err, to_storage_err};

/// Fixed-width UTC timestamp, so text comparison orders chronologically.
fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_time(raw: &str) -> SessionResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(serde_err)
}

/// Fetch a record.
pub fn get_record(conn: &Connection, token: &SessionToken) -> SessionResult<Option<SessionRecord>> {
    let row = conn
        .query_row(
            "SELECT last_visit, visit_count, metadata FROM session_records WHERE token = ?1",
            params![token.as_str()],
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let Some((last_visit, visit_count, metadata)) = row else {
        return Ok(None);
    };
    Ok(Some(SessionRecord {
        last_visit: last_visit.as_deref().map(decode_time).transpose()?,
        visit_count: u64::try_from(visit_count).map_err(serde_err)?,
        metadata: serde_json::from_str(&metadata).map_err(serde_err)?,
    }))
}

/// Insert or replace a record.
pub fn upsert_record(
    conn: &Connection,
    token: &SessionToken,
    record: &SessionRecord,
) -> SessionResult<()> {
    let visit_count = i64::try_from(record.visit_count).map_err(serde_err)?;
    let metadata = serde_json::to_string(&record.metadata).map_err(serde_err)?;
    conn.execute(
        "INSERT INTO session_records (token, last_visit, visit_count, metadata, updated_at)
         VALUES (?1, ?2, ?3, ?4, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
         ON CONFLICT(token) DO UPDATE SET
             last_visit = excluded.last_visit,
             visit_count = excluded.visit_count,
             metadata = excluded.metadata,
             updated_at = excluded.updated_at",
        params![
            token.as_str(),
            record.last_visit.map(encode_time),
            visit_count,
            metadata
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Delete a record. Returns whether a row was removed.
pub fn delete_record(conn: &Connection, token: &SessionToken) -> SessionResult<bool> {
    let changed = conn
        .execute(
            "DELETE FROM session_records WHERE token = ?1",
            params![token.as_str()],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(changed > 0)
}

/// Delete records last visited before `cutoff`.
pub fn delete_idle(conn: &Connection, cutoff: DateTime<Utc>) -> SessionResult<usize> {
    conn.execute(
        "DELETE FROM session_records WHERE last_visit IS NOT NULL AND last_visit < ?1",
        params![encode_time(cutoff)],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Total stored records.
pub fn count_records(conn: &Connection) -> SessionResult<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM session_records", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(usize::try_from(count).unwrap_or_default())
}
