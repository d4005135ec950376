//! Per-token advisory lock on `sess_<token>.lock`.
//!
//! Works across threads and processes: every acquisition opens its own
//! handle, so the OS lock (flock / LockFileEx) arbitrates. The wait is
//! bounded; expiry surfaces as `StorageError::LockTimeout`.

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use fd_lock::RwLock;

use visitkeep_core::errors::{SessionResult, StorageError};
use visitkeep_core::SessionToken;

use super::record_io::owner_only;
use crate::io_err;

const INITIAL_BACKOFF: Duration = Duration::from_millis(1);
const MAX_BACKOFF: Duration = Duration::from_millis(25);

/// Run `f` while holding the exclusive lock for `token`.
pub(crate) fn with_token_lock<T>(
    lock_path: &Path,
    token: &SessionToken,
    timeout: Duration,
    f: impl FnOnce() -> SessionResult<T>,
) -> SessionResult<T> {
    let started = Instant::now();
    let mut backoff = INITIAL_BACKOFF;

    loop {
        let file = owner_only()
            .open(lock_path)
            .map_err(|e| io_err(lock_path, e))?;
        let mut lock = RwLock::new(file);

        match lock.try_write() {
            Ok(guard) => {
                // The holder we waited on may have removed the lock file.
                if !still_linked(&guard, lock_path)? {
                    continue;
                }
                let result = f();
                drop(guard);
                return result;
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                let waited = started.elapsed();
                if waited >= timeout {
                    tracing::warn!(
                        token = token.log_prefix(),
                        waited_ms = waited.as_millis() as u64,
                        "session lock timed out"
                    );
                    return Err(StorageError::LockTimeout {
                        token_prefix: token.log_prefix().to_string(),
                        waited_ms: waited.as_millis() as u64,
                    }
                    .into());
                }
                std::thread::sleep(backoff.min(timeout - waited));
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Err(e) => return Err(io_err(lock_path, e)),
        };
    }
}

/// Whether `path` still names the file we locked.
#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> SessionResult<bool> {
    use std::os::unix::fs::MetadataExt;

    let held = file.metadata().map_err(|e| io_err(path, e))?;
    match std::fs::metadata(path) {
        Ok(current) => Ok(current.dev() == held.dev() && current.ino() == held.ino()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_err(path, e)),
    }
}

#[cfg(not(unix))]
fn still_linked(_file: &File, _path: &Path) -> SessionResult<bool> {
    Ok(true)
}
