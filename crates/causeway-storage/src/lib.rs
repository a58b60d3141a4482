//! # causeway-storage
//!
//! SQLite persistence for the event ledger.
//!
//! One serialized write connection plus a round-robin read pool, versioned
//! migrations, raw-SQL query modules, and the two sequence assigners.
//! [`StorageEngine`] implements every storage trait from `causeway-core`.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;
pub mod sequence;

pub use engine::StorageEngine;
pub use sequence::{InProcessSequencer, StoreSequencer};

use causeway_core::errors::{CausewayError, StorageError};
use rusqlite::ErrorCode;

/// Wrap an error message as a generic SQLite storage error.
pub fn to_storage_err(message: String) -> CausewayError {
    StorageError::SqliteError { message }.into()
}

/// Map a rusqlite error, keeping busy/locked failures distinguishable so
/// callers can retry them.
pub(crate) fn map_sqlite_err(context: &str, e: rusqlite::Error) -> CausewayError {
    if is_busy(&e) {
        return StorageError::Busy {
            message: format!("{context}: {e}"),
        }
        .into();
    }
    to_storage_err(format!("{context}: {e}"))
}

pub(crate) fn is_busy(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

/// Name of the column behind a UNIQUE violation, e.g. `idempotency_key`.
pub(crate) fn unique_violation_column(e: &rusqlite::Error) -> Option<&str> {
    match e {
        rusqlite::Error::SqliteFailure(err, Some(msg))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            msg.rsplit('.').next()
        }
        _ => None,
    }
}
