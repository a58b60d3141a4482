//! Read-only connections for queries. WAL lets them run alongside the writer.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, TryLockError};

use rusqlite::{Connection, OpenFlags};

use causeway_core::errors::{CausewayError, CausewayResult};

use super::config::PoolConfig;
use super::pragmas::apply_read_pragmas;
use crate::to_storage_err;

pub struct ReadPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ReadPool {
    pub fn open(path: &Path, config: &PoolConfig) -> CausewayResult<Self> {
        let connections = (0..config.effective_readers())
            .map(|_| -> CausewayResult<Mutex<Connection>> {
                let conn = Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )
                .map_err(|e| to_storage_err(e.to_string()))?;
                apply_read_pragmas(&conn, config.busy_timeout_ms)?;
                Ok(Mutex::new(conn))
            })
            .collect::<CausewayResult<Vec<_>>>()?;
        Ok(Self {
            connections,
            next: AtomicUsize::new(0),
        })
    }

    /// Run `f` on an idle read connection. Starts from a rotating offset so
    /// load spreads evenly; waits on that first pick only when every
    /// connection is busy.
    pub fn with_conn<F, T>(&self, f: F) -> CausewayResult<T>
    where
        F: FnOnce(&Connection) -> CausewayResult<T>,
    {
        let len = self.connections.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % len;
        for offset in 0..len {
            match self.connections[(start + offset) % len].try_lock() {
                Ok(guard) => return f(&guard),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(e)) => return Err(poisoned(e)),
            }
        }
        let guard = self.connections[start].lock().map_err(poisoned)?;
        f(&guard)
    }

    pub fn size(&self) -> usize {
        self.connections.len()
    }
}

fn poisoned(e: impl std::fmt::Display) -> CausewayError {
    to_storage_err(format!("read connection lock poisoned: {e}"))
}
