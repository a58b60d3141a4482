//! Insert and point lookups for ledger records.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use causeway_core::checksum;
use causeway_core::errors::{CausewayResult, LedgerError};
use causeway_core::models::{EventId, EventRecord, InsertOutcome, NewEvent};

use super::row::{format_ts, query_event, EVENT_COLUMNS};
use crate::{map_sqlite_err, unique_violation_column};

/// Persist a new `pending` record.
///
/// A reused idempotency key is not an error: the record that already holds
/// the key comes back as [`InsertOutcome::KeyExists`]. A reused sequence
/// number is a retryable `SequenceConflict`.
pub fn insert_event(conn: &Connection, event: &NewEvent) -> CausewayResult<InsertOutcome> {
    if let Some(key) = event.idempotency_key.as_deref() {
        if let Some(existing) = find_by_idempotency_key(conn, key)? {
            return Ok(InsertOutcome::KeyExists(existing));
        }
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| map_sqlite_err("insert_event begin", e))?;

    match insert_event_inner(&tx, event) {
        Ok(id) => {
            tx.commit()
                .map_err(|e| map_sqlite_err("insert_event commit", e))?;
            debug!(event_id = id, sequence_num = event.sequence_num, trace_id = %event.trace_id, "inserted ledger event");
            let record = get_event(conn, id)?.ok_or(LedgerError::EventNotFound { event_id: id })?;
            Ok(InsertOutcome::Inserted(record))
        }
        Err(InsertFailure::KeyTaken) => {
            let _ = tx.rollback();
            let key = event.idempotency_key.as_deref().unwrap_or_default();
            match find_by_idempotency_key(conn, key)? {
                Some(existing) => Ok(InsertOutcome::KeyExists(existing)),
                None => Err(LedgerError::SequenceConflict {
                    reason: format!("idempotency key {key:?} vanished during insert"),
                }
                .into()),
            }
        }
        Err(InsertFailure::Other(e)) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

enum InsertFailure {
    KeyTaken,
    Other(causeway_core::CausewayError),
}

impl From<serde_json::Error> for InsertFailure {
    fn from(e: serde_json::Error) -> Self {
        InsertFailure::Other(e.into())
    }
}

fn insert_event_inner(conn: &Connection, event: &NewEvent) -> Result<EventId, InsertFailure> {
    let payload_json = serde_json::to_string(&event.payload)?;
    let clock_json = event
        .vector_clock
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let inserted = conn.execute(
        "INSERT INTO event_ledger (
            trace_id, session_id, idempotency_key, sequence_num, vector_clock, client_id,
            event_type, schema_version, payload, target_id, checksum, status, created_at,
            broadcast_status, parent_event_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'pending', ?12, 'pending', ?13)",
        params![
            event.trace_id,
            event.session_id,
            event.idempotency_key,
            event.sequence_num,
            clock_json,
            event.client_id,
            event.event_type.as_str(),
            event.schema_version,
            payload_json,
            event.target_id,
            event.checksum,
            format_ts(event.created_at),
            event.parent_event_id,
        ],
    );

    if let Err(e) = inserted {
        return Err(match unique_violation_column(&e) {
            Some("idempotency_key") => InsertFailure::KeyTaken,
            Some("sequence_num") => InsertFailure::Other(
                LedgerError::SequenceConflict {
                    reason: format!("sequence number {} already assigned", event.sequence_num),
                }
                .into(),
            ),
            _ => InsertFailure::Other(map_sqlite_err("insert_event", e)),
        });
    }
    let id = conn.last_insert_rowid();

    // Keep the high-water mark ahead of every stored number, whichever
    // assigner produced it.
    conn.execute(
        "UPDATE ledger_sequence SET value = MAX(value, ?1) WHERE name = 'event_ledger'",
        params![event.sequence_num],
    )
    .map_err(|e| InsertFailure::Other(map_sqlite_err("bump ledger_sequence", e)))?;

    Ok(id)
}

pub fn get_event(conn: &Connection, id: EventId) -> CausewayResult<Option<EventRecord>> {
    query_event(
        conn,
        &format!("SELECT {EVENT_COLUMNS} FROM event_ledger WHERE id = ?1"),
        params![id],
    )
}

pub fn find_by_idempotency_key(conn: &Connection, key: &str) -> CausewayResult<Option<EventRecord>> {
    query_event(
        conn,
        &format!("SELECT {EVENT_COLUMNS} FROM event_ledger WHERE idempotency_key = ?1"),
        params![key],
    )
}

/// Recompute the checksum over the payload text exactly as stored, without
/// going through the typed decoder. `None` when the id does not exist.
pub fn verify_stored_checksum(conn: &Connection, id: EventId) -> CausewayResult<Option<bool>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT payload, checksum FROM event_ledger WHERE id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|e| map_sqlite_err("verify_stored_checksum", e))?;

    match row {
        Some((payload, stored)) => {
            let value: serde_json::Value = serde_json::from_str(&payload)?;
            Ok(Some(checksum::checksum_value(&value) == stored))
        }
        None => Ok(None),
    }
}
