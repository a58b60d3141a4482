//! v001: event_ledger, ledger_sequence.

use rusqlite::Connection;

use causeway_core::errors::CausewayResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> CausewayResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS event_ledger (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            trace_id         TEXT NOT NULL,
            session_id       TEXT,
            idempotency_key  TEXT,
            sequence_num     INTEGER NOT NULL,
            vector_clock     TEXT,
            client_id        TEXT,
            event_type       TEXT NOT NULL,
            schema_version   INTEGER NOT NULL DEFAULT 1,
            payload          TEXT NOT NULL,
            target_id        TEXT,
            checksum         TEXT NOT NULL,
            status           TEXT NOT NULL DEFAULT 'pending',
            created_at       TEXT NOT NULL,
            started_at       TEXT,
            completed_at     TEXT,
            error_message    TEXT,
            duration_ms      INTEGER,
            broadcast_status TEXT NOT NULL DEFAULT 'pending',
            last_applied_id  INTEGER,
            parent_event_id  INTEGER,
            superseded_by    INTEGER,
            review_required  INTEGER NOT NULL DEFAULT 0,
            CHECK (status IN ('pending', 'processing', 'completed', 'failed', 'skipped')),
            CHECK (broadcast_status IN ('pending', 'sent', 'failed'))
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_event_ledger_sequence
            ON event_ledger(sequence_num);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_event_ledger_idempotency
            ON event_ledger(idempotency_key) WHERE idempotency_key IS NOT NULL;
        CREATE INDEX IF NOT EXISTS idx_event_ledger_trace
            ON event_ledger(trace_id);
        CREATE INDEX IF NOT EXISTS idx_event_ledger_session_created
            ON event_ledger(session_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_event_ledger_type_status
            ON event_ledger(event_type, status);
        CREATE INDEX IF NOT EXISTS idx_event_ledger_target
            ON event_ledger(target_id, sequence_num);
        CREATE INDEX IF NOT EXISTS idx_event_ledger_status_created
            ON event_ledger(status, created_at);
        CREATE INDEX IF NOT EXISTS idx_event_ledger_broadcast
            ON event_ledger(broadcast_status, status, sequence_num);

        -- High-water mark: survives compaction so numbers are never reissued.
        CREATE TABLE IF NOT EXISTS ledger_sequence (
            name  TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        );
        INSERT OR IGNORE INTO ledger_sequence (name, value) VALUES ('event_ledger', 0);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
