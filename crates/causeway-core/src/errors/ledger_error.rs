use crate::models::{EventId, EventStatus, EventType};

/// Errors raised by ledger writes and lifecycle transitions.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The assigner could not guarantee a unique sequence number. Retryable.
    #[error("sequence conflict: {reason}")]
    SequenceConflict { reason: String },

    /// Stored checksum does not match the payload. Never retryable.
    #[error("checksum mismatch on event {event_id}: stored {stored}, computed {computed}")]
    ChecksumMismatch {
        event_id: EventId,
        stored: String,
        computed: String,
    },

    #[error("invalid transition for event {event_id}: {from} -> {to}")]
    InvalidTransition {
        event_id: EventId,
        from: EventStatus,
        to: EventStatus,
    },

    /// The record lost a conflict and may only be skipped or failed.
    #[error("event {event_id} was superseded by {superseded_by} and cannot be applied")]
    Superseded {
        event_id: EventId,
        superseded_by: EventId,
    },

    #[error("event not found: {event_id}")]
    EventNotFound { event_id: EventId },

    #[error("payload mismatch: declared {declared}, payload is {actual}")]
    PayloadMismatch {
        declared: EventType,
        actual: EventType,
    },

    #[error("invalid payload for {event_type}: {reason}")]
    InvalidPayload { event_type: EventType, reason: String },

    #[error("unsupported schema version {version} for {event_type} (max {supported})")]
    UnsupportedSchema {
        event_type: EventType,
        version: u32,
        supported: u32,
    },

    /// A session lifecycle event arrived without the event that must precede it.
    #[error("closure chain violation in trace {trace_id}: {event_type} requires {required}")]
    ClosureChainViolation {
        trace_id: String,
        event_type: EventType,
        required: EventType,
    },
}
