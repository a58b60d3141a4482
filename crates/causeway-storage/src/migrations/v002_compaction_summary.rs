//! v002: compaction_summary (append-only).

use rusqlite::Connection;

use causeway_core::errors::CausewayResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> CausewayResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS compaction_summary (
            id                     INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id                 TEXT NOT NULL,
            created_at             TEXT NOT NULL,
            dry_run                INTEGER NOT NULL DEFAULT 0,
            events_by_type         TEXT NOT NULL DEFAULT '{}',
            events_by_status       TEXT NOT NULL DEFAULT '{}',
            total_events_compacted INTEGER NOT NULL DEFAULT 0,
            total_duration_ms      INTEGER NOT NULL DEFAULT 0,
            avg_duration_ms        REAL,
            earliest_event_at      TEXT,
            latest_event_at        TEXT,
            events_deleted         INTEGER NOT NULL DEFAULT 0,
            success                INTEGER NOT NULL DEFAULT 1,
            error_message          TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_compaction_summary_created
            ON compaction_summary(created_at);

        CREATE TRIGGER IF NOT EXISTS compaction_summary_no_delete
        BEFORE DELETE ON compaction_summary
        BEGIN
            SELECT RAISE(ABORT, 'compaction_summary is append-only');
        END;

        -- Only the deleted-row count may be filled in after insert.
        CREATE TRIGGER IF NOT EXISTS compaction_summary_no_update
        BEFORE UPDATE OF run_id, created_at, dry_run, events_by_type, events_by_status,
                         total_events_compacted, total_duration_ms, avg_duration_ms,
                         earliest_event_at, latest_event_at, success, error_message
        ON compaction_summary
        BEGIN
            SELECT RAISE(ABORT, 'compaction_summary is append-only');
        END;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
