//! v003: domain_records (origin-hash index for deduplication).

use rusqlite::Connection;

use causeway_core::errors::CausewayResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> CausewayResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS domain_records (
            record_id   TEXT PRIMARY KEY,
            scope       TEXT NOT NULL,
            title       TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            assignee    TEXT,
            origin_hash TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_domain_records_hash
            ON domain_records(origin_hash, scope);
        CREATE INDEX IF NOT EXISTS idx_domain_records_scope_created
            ON domain_records(scope, created_at);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
