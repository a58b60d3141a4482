use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BroadcastStatus, EventPayload, EventStatus, EventType};
use crate::clock::VectorClock;

/// Store-assigned row id of a ledger record.
pub type EventId = i64;

/// One ledger entry.
///
/// Created by the ledger service, mutated only through its lifecycle methods
/// and by the conflict coordinator, deleted only by compaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub trace_id: String,
    pub session_id: Option<String>,
    pub idempotency_key: Option<String>,

    pub sequence_num: i64,
    pub vector_clock: Option<VectorClock>,
    /// Client that authored the event; `None` for server-issued events.
    pub client_id: Option<String>,

    pub event_type: EventType,
    pub schema_version: u32,
    pub payload: EventPayload,
    /// Logical target derived from the payload (task id, meeting id, ...).
    pub target_id: Option<String>,
    pub checksum: String,

    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub duration_ms: Option<i64>,
    pub broadcast_status: BroadcastStatus,
    pub last_applied_id: Option<EventId>,
    pub parent_event_id: Option<EventId>,

    /// Set on the losing side of a resolved conflict; excluded from application.
    pub superseded_by: Option<EventId>,
    /// Set when a conflict needs an operator or end-user decision.
    pub review_required: bool,
}

impl EventRecord {
    /// Whether this record may still be applied downstream.
    pub fn is_applicable(&self) -> bool {
        self.superseded_by.is_none() && self.status != EventStatus::Failed
    }
}

/// One lifecycle step, as written to the store.
///
/// Only the columns owned by `to` are persisted: `processing` writes
/// `started_at`; `completed` writes `completed_at`, `duration_ms` and
/// `last_applied_id`; `failed` and `skipped` write `completed_at`,
/// `duration_ms` and append `message` to any note already on the record.
/// Conflict bookkeeping written in the meantime is never overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTransition {
    pub event_id: EventId,
    pub from: EventStatus,
    pub to: EventStatus,
    pub at: DateTime<Utc>,
    pub duration_ms: Option<i64>,
    pub message: Option<String>,
}

impl StatusTransition {
    /// Whether the step applies the record downstream, which a superseded
    /// record may never be.
    pub fn applies(&self) -> bool {
        matches!(self.to, EventStatus::Processing | EventStatus::Completed)
    }
}

/// Everything the store needs to persist a fresh `pending` record.
///
/// Sequence number and checksum are filled in by the ledger service.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub trace_id: String,
    pub session_id: Option<String>,
    pub idempotency_key: Option<String>,
    pub sequence_num: i64,
    pub vector_clock: Option<VectorClock>,
    pub client_id: Option<String>,
    pub event_type: EventType,
    pub schema_version: u32,
    pub payload: EventPayload,
    pub target_id: Option<String>,
    pub checksum: String,
    pub parent_event_id: Option<EventId>,
    pub created_at: DateTime<Utc>,
}

/// Result of persisting a [`NewEvent`].
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Inserted(EventRecord),
    /// Another writer already holds the idempotency key.
    KeyExists(EventRecord),
}
