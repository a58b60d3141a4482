//! The single write connection. Every ledger write, sequence bump and
//! compaction runs on it, one at a time.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use causeway_core::errors::CausewayResult;

use super::config::PoolConfig;
use super::pragmas::apply_pragmas;
use crate::to_storage_err;

pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path, config: &PoolConfig) -> CausewayResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, config.busy_timeout_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> CausewayResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, PoolConfig::default().busy_timeout_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with exclusive use of the writer, waiting for any write in
    /// flight. Plain blocking call: usable from worker threads and from
    /// inside an async runtime alike.
    pub fn with_conn<F, T>(&self, f: F) -> CausewayResult<T>
    where
        F: FnOnce(&Connection) -> CausewayResult<T>,
    {
        // A panic mid-write leaves no open transaction behind (dropping an
        // uncommitted transaction rolls it back), but refuse further writes
        // until the process is looked at.
        let guard = self
            .conn
            .lock()
            .map_err(|e| to_storage_err(format!("write connection lock poisoned: {e}")))?;
        f(&guard)
    }
}
