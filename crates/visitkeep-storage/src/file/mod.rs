//! FileSessionStore: one JSON document per token.
//!
//! Layout inside the store directory:
//! - `sess_<token>.json`: the record, replaced atomically on every write.
//! - `sess_<token>.lock`: advisory lock serializing read-modify-write cycles.

mod lock;
pub(crate) mod record_io;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use visitkeep_core::constants::RECORD_FILE_PREFIX;
use visitkeep_core::errors::SessionResult;
use visitkeep_core::{ISessionStore, RecordTransition, SessionRecord, SessionToken};

use crate::io_err;

const RECORD_EXT: &str = ".json";
const LOCK_EXT: &str = ".lock";

/// File-per-token session store.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl FileSessionStore {
    /// Open a store in `dir`, creating it (mode 0700) if missing.
    pub fn open(dir: &Path, lock_timeout: Duration) -> SessionResult<Self> {
        record_io::ensure_dir(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            lock_timeout,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for `token`.
    pub fn record_path(&self, token: &SessionToken) -> PathBuf {
        self.dir
            .join(format!("{RECORD_FILE_PREFIX}{}{RECORD_EXT}", token.as_str()))
    }

    fn lock_path(&self, token: &SessionToken) -> PathBuf {
        self.dir
            .join(format!("{RECORD_FILE_PREFIX}{}{LOCK_EXT}", token.as_str()))
    }

    fn locked<T>(
        &self,
        token: &SessionToken,
        f: impl FnOnce() -> SessionResult<T>,
    ) -> SessionResult<T> {
        lock::with_token_lock(&self.lock_path(token), token, self.lock_timeout, f)
    }

    /// Tokens with a record file in the store directory.
    fn stored_tokens(&self) -> SessionResult<Vec<SessionToken>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        let mut tokens = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&self.dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(raw) = name
                .strip_prefix(RECORD_FILE_PREFIX)
                .and_then(|rest| rest.strip_suffix(RECORD_EXT))
            else {
                continue;
            };
            if let Ok(token) = SessionToken::parse(raw) {
                tokens.push(token);
            }
        }
        Ok(tokens)
    }
}

impl ISessionStore for FileSessionStore {
    fn load(&self, token: &SessionToken) -> SessionResult<SessionRecord> {
        // Writers rename complete files into place, so an unlocked read
        // never observes a partial record.
        Ok(record_io::read_record(&self.record_path(token))?.unwrap_or_default())
    }

    fn save(&self, token: &SessionToken, record: &SessionRecord) -> SessionResult<()> {
        let path = self.record_path(token);
        self.locked(token, || record_io::write_record(&path, record))
    }

    fn update(
        &self,
        token: &SessionToken,
        mutate: &mut dyn FnMut(&mut SessionRecord),
    ) -> SessionResult<RecordTransition> {
        let path = self.record_path(token);
        self.locked(token, || {
            let stored = record_io::read_record(&path)?;
            let created = stored.is_none();
            let before = stored.unwrap_or_default();
            let mut after = before.clone();
            mutate(&mut after);
            record_io::write_record(&path, &after)?;
            debug!(
                token = token.log_prefix(),
                created,
                visit_count = after.visit_count,
                "session record updated"
            );
            Ok(RecordTransition {
                before,
                after,
                created,
            })
        })
    }

    fn remove(&self, token: &SessionToken) -> SessionResult<bool> {
        let path = self.record_path(token);
        let lock_path = self.lock_path(token);
        self.locked(token, || {
            let existed = record_io::remove_if_exists(&path)?;
            // Waiters notice the unlinked lock file and reopen.
            record_io::remove_if_exists(&lock_path)?;
            Ok(existed)
        })
    }

    fn purge_idle(&self, cutoff: DateTime<Utc>) -> SessionResult<usize> {
        let mut purged = 0;
        for token in self.stored_tokens()? {
            let idle = record_io::read_record(&self.record_path(&token))?
                .is_some_and(|record| record.idle_since(cutoff));
            if !idle {
                continue;
            }
            // Re-check under the lock: a visit may have landed meanwhile.
            let path = self.record_path(&token);
            let lock_path = self.lock_path(&token);
            let removed = self.locked(&token, || {
                match record_io::read_record(&path)? {
                    Some(record) if record.idle_since(cutoff) => {
                        record_io::remove_if_exists(&path)?;
                        record_io::remove_if_exists(&lock_path)?;
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            })?;
            if removed {
                purged += 1;
            }
        }
        info!(purged, cutoff = %cutoff, dir = %self.dir.display(), "idle sessions purged");
        Ok(purged)
    }
}
