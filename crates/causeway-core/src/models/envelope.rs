//! Wire shapes exchanged with the request and broadcast layers.

use serde::{Deserialize, Serialize};

use super::{EventId, EventPayload, EventRecord, EventStatus, EventType};
use crate::clock::VectorClock;

/// A raw submission coming from the request layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSubmission {
    pub trace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub event_type: EventType,
    pub payload: EventPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_event_id: Option<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_clock: Option<VectorClock>,
}

impl EventSubmission {
    /// Server-originated submission with no client clock.
    pub fn server(trace_id: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            trace_id: trace_id.into(),
            session_id: None,
            event_type: payload.event_type(),
            payload,
            idempotency_key: None,
            parent_event_id: None,
            client_id: None,
            vector_clock: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn with_parent(mut self, parent: EventId) -> Self {
        self.parent_event_id = Some(parent);
        self
    }

    pub fn with_client(mut self, client_id: impl Into<String>, clock: VectorClock) -> Self {
        self.client_id = Some(client_id.into());
        self.vector_clock = Some(clock);
        self
    }
}

/// The record as delivered to broadcast subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub trace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub event_type: EventType,
    pub sequence_num: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_clock: Option<VectorClock>,
    pub checksum: String,
    pub payload: EventPayload,
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_applied_id: Option<EventId>,
}

impl From<&EventRecord> for EventEnvelope {
    fn from(record: &EventRecord) -> Self {
        Self {
            trace_id: record.trace_id.clone(),
            session_id: record.session_id.clone(),
            event_type: record.event_type,
            sequence_num: record.sequence_num,
            vector_clock: record.vector_clock.clone(),
            checksum: record.checksum.clone(),
            payload: record.payload.clone(),
            status: record.status,
            idempotency_key: record.idempotency_key.clone(),
            last_applied_id: record.last_applied_id,
        }
    }
}
