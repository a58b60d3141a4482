//! The writer and the read pool.

pub mod config;
pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use causeway_core::errors::CausewayResult;

pub use config::PoolConfig;
pub use read_pool::ReadPool;
pub use write_connection::WriteConnection;

/// The single write connection and, for file-backed databases, the read pool.
///
/// The writer is reference counted so a sequence assigner can share it
/// without borrowing the engine.
pub struct ConnectionPool {
    pub writer: Arc<WriteConnection>,
    /// `None` in memory: a separate in-memory connection is a separate
    /// database, so reads go through the writer.
    pub readers: Option<ReadPool>,
    pub db_path: Option<PathBuf>,
}

impl ConnectionPool {
    pub fn open(path: &Path, config: &PoolConfig) -> CausewayResult<Self> {
        // Writer first: it creates the file and switches it to WAL.
        let writer = WriteConnection::open(path, config)?;
        let readers = ReadPool::open(path, config)?;
        Ok(Self {
            writer: Arc::new(writer),
            readers: Some(readers),
            db_path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory pool (for testing).
    pub fn open_in_memory() -> CausewayResult<Self> {
        Ok(Self {
            writer: Arc::new(WriteConnection::open_in_memory()?),
            readers: None,
            db_path: None,
        })
    }

    /// Run a read on a pooled connection, or on the writer when there is no
    /// read pool.
    pub fn read<F, T>(&self, f: F) -> CausewayResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> CausewayResult<T>,
    {
        match &self.readers {
            Some(readers) => readers.with_conn(f),
            None => self.writer.with_conn(f),
        }
    }
}
