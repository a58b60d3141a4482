//! Builders for ledger records and payloads used across the workspace tests.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};

use causeway_core::checksum;
use causeway_core::models::payload::{
    MeetingCreated, SessionEnded, SessionStarted, TaskCreated, TaskUpdated,
};
use causeway_core::models::{
    BroadcastStatus, EventId, EventRecord, EventStatus, NewEvent, PayloadRegistry,
};
use causeway_core::{EventPayload, VectorClock};

/// Fixed reference instant so ordering assertions are reproducible.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single().unwrap_or_else(Utc::now)
}

pub fn clock(entries: &[(&str, u64)]) -> VectorClock {
    VectorClock::from_entries(entries.iter().map(|(k, v)| (*k, *v)))
}

pub fn session_started(session_id: &str) -> EventPayload {
    EventPayload::SessionStarted(SessionStarted {
        session_id: session_id.to_string(),
        user_id: "user-1".to_string(),
        device: None,
    })
}

pub fn session_ended(session_id: &str) -> EventPayload {
    EventPayload::SessionEnded(SessionEnded {
        session_id: session_id.to_string(),
        reason: None,
    })
}

pub fn task_created(task_id: &str, title: &str) -> EventPayload {
    EventPayload::TaskCreated(TaskCreated {
        task_id: task_id.to_string(),
        title: title.to_string(),
        description: String::new(),
        assignee: None,
    })
}

pub fn task_updated(task_id: &str, field: &str, value: &str) -> EventPayload {
    let mut changes = BTreeMap::new();
    changes.insert(field.to_string(), serde_json::Value::String(value.to_string()));
    EventPayload::TaskUpdated(TaskUpdated {
        task_id: task_id.to_string(),
        changes,
    })
}

pub fn meeting_created(meeting_id: &str, title: &str) -> EventPayload {
    EventPayload::MeetingCreated(MeetingCreated {
        meeting_id: meeting_id.to_string(),
        title: title.to_string(),
        starts_at: None,
    })
}

/// A pending, clockless record targeting `task-1`, created `sequence_num`
/// seconds after [`base_time`].
pub fn record(id: EventId, sequence_num: i64) -> EventRecord {
    let payload = task_updated("task-1", "title", &format!("rev {sequence_num}"));
    let checksum = checksum::checksum(&payload).unwrap_or_default();
    EventRecord {
        id,
        trace_id: "trace-1".to_string(),
        session_id: None,
        idempotency_key: None,
        sequence_num,
        vector_clock: None,
        client_id: None,
        event_type: payload.event_type(),
        schema_version: 1,
        target_id: payload.target_id().map(str::to_string),
        payload,
        checksum,
        status: EventStatus::Pending,
        created_at: base_time() + Duration::seconds(sequence_num),
        started_at: None,
        completed_at: None,
        error_message: None,
        duration_ms: None,
        broadcast_status: BroadcastStatus::Pending,
        last_applied_id: None,
        parent_event_id: None,
        superseded_by: None,
        review_required: false,
    }
}

/// A client-authored record carrying `entries` as its clock.
pub fn clocked(id: EventId, sequence_num: i64, entries: &[(&str, u64)]) -> EventRecord {
    let mut r = record(id, sequence_num);
    r.vector_clock = Some(clock(entries));
    r.client_id = entries.first().map(|(c, _)| c.to_string());
    r
}

/// A server-issued insert request for `payload` in `trace_id`.
pub fn new_event(trace_id: &str, sequence_num: i64, payload: EventPayload) -> NewEvent {
    let event_type = payload.event_type();
    NewEvent {
        trace_id: trace_id.to_string(),
        session_id: None,
        idempotency_key: None,
        sequence_num,
        vector_clock: None,
        client_id: None,
        event_type,
        schema_version: PayloadRegistry::schema_version(event_type),
        target_id: payload.target_id().map(str::to_string),
        checksum: checksum::checksum(&payload).unwrap_or_default(),
        payload,
        parent_event_id: None,
        created_at: Utc::now(),
    }
}
