//! Multi-row reads over the ledger.

use rusqlite::{params, Connection, OptionalExtension};

use causeway_core::errors::CausewayResult;
use causeway_core::models::{EventRecord, EventType};

use super::row::{query_event, query_events, EVENT_COLUMNS};
use crate::map_sqlite_err;

/// Every record in a trace, in creation order.
pub fn events_for_trace(conn: &Connection, trace_id: &str) -> CausewayResult<Vec<EventRecord>> {
    query_events(
        conn,
        &format!(
            "SELECT {EVENT_COLUMNS} FROM event_ledger
             WHERE trace_id = ?1 ORDER BY created_at, sequence_num"
        ),
        params![trace_id],
    )
}

pub fn events_for_session(conn: &Connection, session_id: &str) -> CausewayResult<Vec<EventRecord>> {
    query_events(
        conn,
        &format!(
            "SELECT {EVENT_COLUMNS} FROM event_ledger
             WHERE session_id = ?1 ORDER BY created_at, sequence_num"
        ),
        params![session_id],
    )
}

/// The `limit` most recent records for a target, returned oldest first.
pub fn events_for_target(
    conn: &Connection,
    target_id: &str,
    limit: usize,
) -> CausewayResult<Vec<EventRecord>> {
    query_events(
        conn,
        &format!(
            "SELECT {EVENT_COLUMNS} FROM (
                SELECT * FROM event_ledger WHERE target_id = ?1
                ORDER BY sequence_num DESC LIMIT ?2
             ) ORDER BY sequence_num"
        ),
        params![target_id, limit as i64],
    )
}

/// Most recent applicable record of `event_type` for a target. Records that
/// lost a conflict are skipped.
pub fn latest_event_for_target(
    conn: &Connection,
    event_type: EventType,
    target_id: &str,
) -> CausewayResult<Option<EventRecord>> {
    query_event(
        conn,
        &format!(
            "SELECT {EVENT_COLUMNS} FROM event_ledger
             WHERE event_type = ?1 AND target_id = ?2 AND superseded_by IS NULL
             ORDER BY created_at DESC, sequence_num DESC LIMIT 1"
        ),
        params![event_type.as_str(), target_id],
    )
}

pub fn trace_has_event_type(
    conn: &Connection,
    trace_id: &str,
    event_type: EventType,
) -> CausewayResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM event_ledger WHERE trace_id = ?1 AND event_type = ?2 LIMIT 1",
            params![trace_id, event_type.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| map_sqlite_err("trace_has_event_type", e))?;
    Ok(found.is_some())
}
