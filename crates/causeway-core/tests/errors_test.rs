use causeway_core::errors::*;
use causeway_core::{EventStatus, EventType};

#[test]
fn sequence_conflict_is_retryable() {
    let err: CausewayError = LedgerError::SequenceConflict {
        reason: "counter locked".into(),
    }
    .into();
    assert!(err.is_retryable());
    assert!(!err.is_fatal());
}

#[test]
fn busy_store_is_retryable() {
    let err: CausewayError = StorageError::Busy {
        message: "database is locked".into(),
    }
    .into();
    assert!(err.is_retryable());
}

#[test]
fn checksum_mismatch_is_fatal_and_not_retryable() {
    let err: CausewayError = LedgerError::ChecksumMismatch {
        event_id: 7,
        stored: "aa".into(),
        computed: "bb".into(),
    }
    .into();
    assert!(!err.is_retryable());
    assert!(err.is_fatal());
    let msg = err.to_string();
    assert!(msg.contains('7'));
    assert!(msg.contains("aa"));
    assert!(msg.contains("bb"));
}

#[test]
fn closure_chain_violation_is_fatal() {
    let err: CausewayError = LedgerError::ClosureChainViolation {
        trace_id: "trace-1".into(),
        event_type: EventType::SessionEnded,
        required: EventType::SessionStarted,
    }
    .into();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("session_started"));
}

#[test]
fn invalid_transition_carries_states() {
    let err = LedgerError::InvalidTransition {
        event_id: 3,
        from: EventStatus::Completed,
        to: EventStatus::Processing,
    };
    let msg = err.to_string();
    assert!(msg.contains("completed"));
    assert!(msg.contains("processing"));
}

#[test]
fn compaction_failure_converts_to_causeway_error() {
    let err: CausewayError = CompactionError::CompactionFailure {
        run_id: "run-1".into(),
        reason: "disk full".into(),
    }
    .into();
    assert!(matches!(err, CausewayError::CompactionError(_)));
}

#[test]
fn serialization_error_converts_to_causeway_error() {
    let json_err = serde_json::from_str::<String>("not valid json").unwrap_err();
    let err: CausewayError = json_err.into();
    assert!(matches!(err, CausewayError::SerializationError(_)));
}

#[test]
fn superseded_is_neither_retryable_nor_fatal() {
    let err: CausewayError = LedgerError::Superseded {
        event_id: 2,
        superseded_by: 1,
    }
    .into();
    assert!(!err.is_retryable());
    assert!(!err.is_fatal());
    assert!(err.to_string().contains("superseded by 1"));
}
