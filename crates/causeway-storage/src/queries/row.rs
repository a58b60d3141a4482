//! Row <-> record mapping and timestamp encoding.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Params, Row};

use causeway_core::errors::{CausewayResult, StorageError};
use causeway_core::models::{
    BroadcastStatus, EventId, EventRecord, EventStatus, EventType, PayloadRegistry,
};
use causeway_core::VectorClock;

use crate::map_sqlite_err;

pub(crate) const EVENT_COLUMNS: &str = "id, trace_id, session_id, idempotency_key, sequence_num, \
     vector_clock, client_id, event_type, schema_version, payload, target_id, checksum, status, \
     created_at, started_at, completed_at, error_message, duration_ms, broadcast_status, \
     last_applied_id, parent_event_id, superseded_by, review_required";

/// Fixed-width UTC timestamps so text comparison matches time order.
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(raw: &str) -> CausewayResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| corruption(format!("bad timestamp {raw:?}: {e}")))
}

pub(crate) fn parse_opt_ts(raw: Option<String>) -> CausewayResult<Option<DateTime<Utc>>> {
    raw.as_deref().map(parse_ts).transpose()
}

pub(crate) fn corruption(details: String) -> causeway_core::CausewayError {
    StorageError::CorruptionDetected { details }.into()
}

pub(crate) fn parse_enum<T: FromStr<Err = String>>(raw: &str) -> CausewayResult<T> {
    T::from_str(raw).map_err(corruption)
}

/// Column values as stored, before decoding.
pub(crate) struct RawEvent {
    id: EventId,
    trace_id: String,
    session_id: Option<String>,
    idempotency_key: Option<String>,
    sequence_num: i64,
    vector_clock: Option<String>,
    client_id: Option<String>,
    event_type: String,
    schema_version: u32,
    payload: String,
    target_id: Option<String>,
    checksum: String,
    status: String,
    created_at: String,
    started_at: Option<String>,
    completed_at: Option<String>,
    error_message: Option<String>,
    duration_ms: Option<i64>,
    broadcast_status: String,
    last_applied_id: Option<EventId>,
    parent_event_id: Option<EventId>,
    superseded_by: Option<EventId>,
    review_required: bool,
}

impl RawEvent {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            trace_id: row.get(1)?,
            session_id: row.get(2)?,
            idempotency_key: row.get(3)?,
            sequence_num: row.get(4)?,
            vector_clock: row.get(5)?,
            client_id: row.get(6)?,
            event_type: row.get(7)?,
            schema_version: row.get(8)?,
            payload: row.get(9)?,
            target_id: row.get(10)?,
            checksum: row.get(11)?,
            status: row.get(12)?,
            created_at: row.get(13)?,
            started_at: row.get(14)?,
            completed_at: row.get(15)?,
            error_message: row.get(16)?,
            duration_ms: row.get(17)?,
            broadcast_status: row.get(18)?,
            last_applied_id: row.get(19)?,
            parent_event_id: row.get(20)?,
            superseded_by: row.get(21)?,
            review_required: row.get(22)?,
        })
    }

    /// Decode the typed columns. The payload goes through the registry so
    /// older schema versions are still readable.
    pub(crate) fn into_record(self) -> CausewayResult<EventRecord> {
        let event_type: EventType = parse_enum(&self.event_type)?;
        let raw_payload: serde_json::Value = serde_json::from_str(&self.payload)?;
        let payload = PayloadRegistry::decode(event_type, self.schema_version, &raw_payload)?;
        let vector_clock = self
            .vector_clock
            .as_deref()
            .map(serde_json::from_str::<VectorClock>)
            .transpose()?;

        Ok(EventRecord {
            id: self.id,
            trace_id: self.trace_id,
            session_id: self.session_id,
            idempotency_key: self.idempotency_key,
            sequence_num: self.sequence_num,
            vector_clock,
            client_id: self.client_id,
            event_type,
            schema_version: self.schema_version,
            payload,
            target_id: self.target_id,
            checksum: self.checksum,
            status: parse_enum::<EventStatus>(&self.status)?,
            created_at: parse_ts(&self.created_at)?,
            started_at: parse_opt_ts(self.started_at)?,
            completed_at: parse_opt_ts(self.completed_at)?,
            error_message: self.error_message,
            duration_ms: self.duration_ms,
            broadcast_status: parse_enum::<BroadcastStatus>(&self.broadcast_status)?,
            last_applied_id: self.last_applied_id,
            parent_event_id: self.parent_event_id,
            superseded_by: self.superseded_by,
            review_required: self.review_required,
        })
    }
}

/// Run a query selecting [`EVENT_COLUMNS`] and decode every row.
pub(crate) fn query_events<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> CausewayResult<Vec<EventRecord>> {
    let mut stmt = conn
        .prepare_cached(sql)
        .map_err(|e| map_sqlite_err("prepare", e))?;
    let rows = stmt
        .query_map(params, RawEvent::from_row)
        .map_err(|e| map_sqlite_err("query events", e))?;

    let mut records = Vec::new();
    for raw in rows {
        let raw = raw.map_err(|e| map_sqlite_err("read event row", e))?;
        records.push(raw.into_record()?);
    }
    Ok(records)
}

/// Like [`query_events`] for at most one row.
pub(crate) fn query_event<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> CausewayResult<Option<EventRecord>> {
    let mut stmt = conn
        .prepare_cached(sql)
        .map_err(|e| map_sqlite_err("prepare", e))?;
    stmt.query_row(params, RawEvent::from_row)
        .optional()
        .map_err(|e| map_sqlite_err("query event", e))?
        .map(RawEvent::into_record)
        .transpose()
}

/// `?,?,?` for an `IN (...)` clause of `n` values.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}
