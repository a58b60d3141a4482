//! Schema migrations tracked with `PRAGMA user_version`.

pub mod v001_event_ledger;
pub mod v002_compaction_summary;
pub mod v003_domain_records;

use rusqlite::Connection;
use tracing::info;

use causeway_core::errors::{CausewayResult, StorageError};

use crate::to_storage_err;

type Migration = fn(&Connection) -> CausewayResult<()>;

const MIGRATIONS: &[(u32, Migration)] = &[
    (1, v001_event_ledger::migrate),
    (2, v002_compaction_summary::migrate),
    (3, v003_domain_records::migrate),
];

/// Latest schema version this build knows about.
pub const LATEST_VERSION: u32 = 3;

/// Apply every migration newer than the database's `user_version`.
pub fn run_migrations(conn: &Connection) -> CausewayResult<()> {
    let current = current_version(conn)?;

    for &(version, migrate) in MIGRATIONS {
        if current >= version {
            continue;
        }
        migrate(conn).map_err(|e| StorageError::MigrationFailed {
            version,
            reason: e.to_string(),
        })?;
        conn.pragma_update(None, "user_version", version)
            .map_err(|e| StorageError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        info!(version, "applied migration");
    }
    Ok(())
}

pub fn current_version(conn: &Connection) -> CausewayResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))
}
