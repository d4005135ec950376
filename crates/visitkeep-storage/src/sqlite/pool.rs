//! Small pool of read-write SQLite connections.
//!
//! Callers take the first idle connection, falling back to round-robin when
//! all are busy, so requests for different tokens rarely queue on the same
//! handle.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};

use rusqlite::Connection;

use visitkeep_core::config::defaults::MAX_POOL_SIZE;
use visitkeep_core::errors::SessionResult;

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

pub struct ConnectionPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
    pub db_path: Option<PathBuf>,
}

impl ConnectionPool {
    /// Open `pool_size` connections to the database file at `path`.
    pub fn open(path: &Path, pool_size: usize, busy_timeout_ms: u32) -> SessionResult<Self> {
        let size = pool_size.clamp(1, MAX_POOL_SIZE);
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
            apply_pragmas(&conn, busy_timeout_ms)?;
            connections.push(Mutex::new(conn));
        }
        Ok(Self {
            connections,
            next: AtomicUsize::new(0),
            db_path: Some(path.to_path_buf()),
        })
    }

    /// Single in-memory connection (for testing). Separate in-memory
    /// connections would be separate databases.
    pub fn open_in_memory(busy_timeout_ms: u32) -> SessionResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, busy_timeout_ms)?;
        Ok(Self {
            connections: vec![Mutex::new(conn)],
            next: AtomicUsize::new(0),
            db_path: None,
        })
    }

    /// Execute a closure with a pooled connection.
    pub fn with_conn<F, T>(&self, f: F) -> SessionResult<T>
    where
        F: FnOnce(&mut Connection) -> SessionResult<T>,
    {
        let mut guard = self.checkout()?;
        f(&mut guard)
    }

    fn checkout(&self) -> SessionResult<MutexGuard<'_, Connection>> {
        let len = self.connections.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % len;
        for offset in 0..len {
            match self.connections[(start + offset) % len].try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(e)) => {
                    return Err(to_storage_err(format!("connection lock poisoned: {e}")))
                }
            }
        }
        self.connections[start]
            .lock()
            .map_err(|e| to_storage_err(format!("connection lock poisoned: {e}")))
    }

    /// Number of connections in the pool.
    pub fn size(&self) -> usize {
        self.connections.len()
    }
}
