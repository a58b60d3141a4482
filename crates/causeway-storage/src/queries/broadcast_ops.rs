//! Completed records waiting for the broadcast layer.

use rusqlite::{params, params_from_iter, Connection};

use causeway_core::constants::MAX_SQL_IN_CHUNK;
use causeway_core::errors::CausewayResult;
use causeway_core::models::{BroadcastStatus, EventId, EventRecord};

use super::row::{placeholders, query_events, EVENT_COLUMNS};
use crate::map_sqlite_err;

/// Completed, not yet broadcast records in sequence order. Superseded
/// records are never handed to subscribers.
pub fn pending_broadcasts(conn: &Connection, limit: usize) -> CausewayResult<Vec<EventRecord>> {
    query_events(
        conn,
        &format!(
            "SELECT {EVENT_COLUMNS} FROM event_ledger
             WHERE status = 'completed' AND broadcast_status = 'pending'
               AND superseded_by IS NULL
             ORDER BY sequence_num LIMIT ?1"
        ),
        params![limit as i64],
    )
}

/// Record a delivery attempt. Rows already marked `sent` are left alone.
pub fn mark_broadcast(
    conn: &Connection,
    ids: &[EventId],
    status: BroadcastStatus,
) -> CausewayResult<usize> {
    let mut updated = 0;
    for chunk in ids.chunks(MAX_SQL_IN_CHUNK) {
        let sql = format!(
            "UPDATE event_ledger SET broadcast_status = ?
             WHERE broadcast_status <> 'sent' AND id IN ({})",
            placeholders(chunk.len())
        );
        let values = std::iter::once(rusqlite::types::Value::Text(status.as_str().to_string()))
            .chain(chunk.iter().map(|id| rusqlite::types::Value::Integer(*id)));
        updated += conn
            .execute(&sql, params_from_iter(values))
            .map_err(|e| map_sqlite_err("mark_broadcast", e))?;
    }
    Ok(updated)
}
