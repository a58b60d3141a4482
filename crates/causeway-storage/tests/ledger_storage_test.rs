//! Ledger persistence: inserts, idempotency, lifecycle guards, queries,
//! integrity, and the broadcast queue.

use chrono::{Duration, Utc};

use causeway_core::models::{
    BroadcastStatus, EventId, EventStatus, EventType, InsertOutcome, StatusTransition,
};
use causeway_core::traits::ILedgerStorage;
use causeway_core::errors::LedgerError;
use causeway_core::CausewayError;
use causeway_storage::StorageEngine;
use test_fixtures::{clock, new_event, session_started, task_created, task_updated};

fn step(event_id: EventId, from: EventStatus, to: EventStatus) -> StatusTransition {
    StatusTransition {
        event_id,
        from,
        to,
        at: Utc::now(),
        duration_ms: None,
        message: None,
    }
}

fn inserted(outcome: InsertOutcome) -> causeway_core::EventRecord {
    match outcome {
        InsertOutcome::Inserted(record) => record,
        InsertOutcome::KeyExists(record) => panic!("unexpected existing record {}", record.id),
    }
}

#[test]
fn insert_and_read_back_round_trips_every_column() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mut event = new_event("trace-1", 1, task_updated("task-9", "title", "Buy milk"));
    event.session_id = Some("session-1".into());
    event.vector_clock = Some(clock(&[("A", 2), ("B", 1)]));
    event.client_id = Some("A".into());

    let record = inserted(engine.insert_event(&event).unwrap());
    assert!(record.id > 0);
    assert_eq!(record.status, EventStatus::Pending);
    assert_eq!(record.broadcast_status, BroadcastStatus::Pending);
    assert_eq!(record.target_id.as_deref(), Some("task-9"));
    assert_eq!(record.vector_clock, event.vector_clock);
    assert_eq!(record.payload, event.payload);
    assert_eq!(record.checksum, event.checksum);

    let fetched = engine.get_event(record.id).unwrap().unwrap();
    assert_eq!(fetched, record);
    assert!(causeway_core::checksum::verify(&fetched).unwrap());
}

#[test]
fn reused_idempotency_key_returns_existing_record() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mut first = new_event("trace-1", 1, task_created("task-1", "Clean bedroom"));
    first.idempotency_key = Some("req-42".into());
    let original = inserted(engine.insert_event(&first).unwrap());

    let mut retry = new_event("trace-1", 2, task_created("task-1", "Clean bedroom"));
    retry.idempotency_key = Some("req-42".into());
    match engine.insert_event(&retry).unwrap() {
        InsertOutcome::KeyExists(existing) => assert_eq!(existing.id, original.id),
        InsertOutcome::Inserted(r) => panic!("duplicate row {} created", r.id),
    }
    assert_eq!(engine.event_count().unwrap(), 1);
}

#[test]
fn reused_sequence_number_is_a_retryable_conflict() {
    let engine = StorageEngine::open_in_memory().unwrap();
    engine
        .insert_event(&new_event("trace-1", 7, task_created("task-1", "a")))
        .unwrap();
    let err = engine
        .insert_event(&new_event("trace-2", 7, task_created("task-2", "b")))
        .unwrap_err();
    assert!(matches!(
        err,
        CausewayError::LedgerError(LedgerError::SequenceConflict { .. })
    ));
    assert!(err.is_retryable());
    assert_eq!(engine.event_count().unwrap(), 1);
}

#[test]
fn transition_is_guarded_by_expected_status() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let record = inserted(
        engine
            .insert_event(&new_event("trace-1", 1, task_created("task-1", "a")))
            .unwrap(),
    );

    let stored = engine
        .transition_event(&step(record.id, EventStatus::Pending, EventStatus::Processing))
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, EventStatus::Processing);
    assert!(stored.started_at.is_some());

    // A second writer that still believes the record is pending loses.
    assert!(engine
        .transition_event(&step(record.id, EventStatus::Pending, EventStatus::Skipped))
        .unwrap()
        .is_none());
    assert_eq!(
        engine.get_event(record.id).unwrap().unwrap().status,
        EventStatus::Processing
    );
}

#[test]
fn transition_writes_only_its_own_columns() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let a = inserted(engine.insert_event(&new_event("t", 1, task_updated("task-1", "title", "x"))).unwrap());
    let b = inserted(engine.insert_event(&new_event("t", 2, task_updated("task-1", "title", "y"))).unwrap());
    engine.set_last_applied(b.id, b.id).unwrap();
    engine.flag_for_review(b.id, "concurrent with #1").unwrap();

    let processing = engine
        .transition_event(&step(b.id, EventStatus::Pending, EventStatus::Processing))
        .unwrap()
        .unwrap();
    assert_eq!(processing.last_applied_id, Some(b.id));
    assert_eq!(processing.error_message.as_deref(), Some("concurrent with #1"));

    let mut fail = step(b.id, EventStatus::Processing, EventStatus::Failed);
    fail.duration_ms = Some(12);
    fail.message = Some("timeout".into());
    let failed = engine.transition_event(&fail).unwrap().unwrap();
    assert_eq!(failed.error_message.as_deref(), Some("concurrent with #1; timeout"));
    assert_eq!(failed.duration_ms, Some(12));
    assert!(failed.completed_at.is_some());
    assert_eq!(failed.last_applied_id, Some(b.id));

    let a = engine
        .transition_event(&step(a.id, EventStatus::Pending, EventStatus::Processing))
        .unwrap()
        .unwrap();
    let done = engine
        .transition_event(&step(a.id, EventStatus::Processing, EventStatus::Completed))
        .unwrap()
        .unwrap();
    assert_eq!(done.last_applied_id, Some(a.id));
    assert_eq!(done.started_at, a.started_at);
}

#[test]
fn superseded_record_is_not_applied_or_served() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let a = inserted(engine.insert_event(&new_event("t", 1, task_updated("task-1", "title", "x"))).unwrap());
    let b = inserted(engine.insert_event(&new_event("t", 2, task_updated("task-1", "title", "y"))).unwrap());
    for id in [a.id, b.id] {
        engine
            .transition_event(&step(id, EventStatus::Pending, EventStatus::Processing))
            .unwrap();
    }
    engine
        .transition_event(&step(a.id, EventStatus::Processing, EventStatus::Completed))
        .unwrap();
    engine.mark_superseded(a.id, b.id).unwrap();

    // `a` completed before it lost; it is neither latest nor broadcast.
    let latest = engine
        .latest_event_for_target(EventType::TaskUpdated, "task-1")
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, b.id);
    assert!(engine.pending_broadcasts(10).unwrap().is_empty());

    engine.mark_superseded(b.id, a.id).unwrap();
    assert!(engine
        .transition_event(&step(b.id, EventStatus::Processing, EventStatus::Completed))
        .unwrap()
        .is_none());
    let failed = engine
        .transition_event(&step(b.id, EventStatus::Processing, EventStatus::Failed))
        .unwrap()
        .unwrap();
    assert_eq!(failed.status, EventStatus::Failed);
    assert!(engine
        .latest_event_for_target(EventType::TaskUpdated, "task-1")
        .unwrap()
        .is_none());
}

#[test]
fn conflict_bookkeeping_updates_rows() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let a = inserted(engine.insert_event(&new_event("t", 1, task_updated("task-1", "title", "x"))).unwrap());
    let b = inserted(engine.insert_event(&new_event("t", 2, task_updated("task-1", "title", "y"))).unwrap());

    engine.mark_superseded(a.id, b.id).unwrap();
    engine.set_last_applied(b.id, b.id).unwrap();
    engine.flag_for_review(b.id, "check me").unwrap();

    let a = engine.get_event(a.id).unwrap().unwrap();
    let b = engine.get_event(b.id).unwrap().unwrap();
    assert_eq!(a.superseded_by, Some(b.id));
    assert!(!a.is_applicable());
    assert_eq!(b.last_applied_id, Some(b.id));
    assert!(b.review_required);
    assert_eq!(b.error_message.as_deref(), Some("check me"));

    let missing = engine.mark_superseded(9_999, b.id).unwrap_err();
    assert!(matches!(
        missing,
        CausewayError::LedgerError(LedgerError::EventNotFound { event_id: 9_999 })
    ));
}

#[test]
fn trace_and_target_queries_are_ordered() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let base = Utc::now() - Duration::minutes(10);
    for (seq, value) in [(1, "first"), (2, "second"), (3, "third")] {
        let mut e = new_event("trace-1", seq, task_updated("task-1", "title", value));
        e.created_at = base + Duration::seconds(seq);
        e.session_id = Some("session-1".into());
        engine.insert_event(&e).unwrap();
    }
    engine
        .insert_event(&new_event("trace-2", 4, session_started("s-2")))
        .unwrap();

    let trace = engine.events_for_trace("trace-1").unwrap();
    assert_eq!(trace.iter().map(|r| r.sequence_num).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(engine.events_for_session("session-1").unwrap().len(), 3);

    let recent = engine.events_for_target("task-1", 2).unwrap();
    assert_eq!(recent.iter().map(|r| r.sequence_num).collect::<Vec<_>>(), vec![2, 3]);

    let latest = engine
        .latest_event_for_target(EventType::TaskUpdated, "task-1")
        .unwrap()
        .unwrap();
    assert_eq!(latest.sequence_num, 3);
    assert!(engine
        .latest_event_for_target(EventType::TaskCreated, "task-1")
        .unwrap()
        .is_none());

    assert!(engine.trace_has_event_type("trace-2", EventType::SessionStarted).unwrap());
    assert!(!engine.trace_has_event_type("trace-1", EventType::SessionStarted).unwrap());
}

#[test]
fn tampered_payload_fails_stored_checksum() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let record = inserted(
        engine
            .insert_event(&new_event("trace-1", 1, task_created("task-1", "Original")))
            .unwrap(),
    );
    assert_eq!(engine.verify_stored_checksum(record.id).unwrap(), Some(true));

    engine
        .pool()
        .writer
        .with_conn(|conn| {
            conn.execute(
                "UPDATE event_ledger SET payload = replace(payload, 'Original', 'Forged') WHERE id = ?1",
                [record.id],
            )
            .unwrap();
            Ok(())
        })
        .unwrap();

    assert_eq!(engine.verify_stored_checksum(record.id).unwrap(), Some(false));
    let tampered = engine.get_event(record.id).unwrap().unwrap();
    assert!(!causeway_core::checksum::verify(&tampered).unwrap());
    assert_eq!(engine.verify_stored_checksum(12_345).unwrap(), None);
}

#[test]
fn broadcast_queue_only_serves_completed_pending_rows() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mut ids = Vec::new();
    for seq in 1..=3 {
        let record = inserted(
            engine
                .insert_event(&new_event("t", seq, task_created(&format!("task-{seq}"), "x")))
                .unwrap(),
        );
        if seq != 2 {
            engine
                .transition_event(&step(record.id, EventStatus::Pending, EventStatus::Processing))
                .unwrap();
            engine
                .transition_event(&step(record.id, EventStatus::Processing, EventStatus::Completed))
                .unwrap();
        }
        ids.push(record.id);
    }

    let pending = engine.pending_broadcasts(10).unwrap();
    assert_eq!(pending.iter().map(|r| r.sequence_num).collect::<Vec<_>>(), vec![1, 3]);

    assert_eq!(engine.mark_broadcast(&[ids[0]], BroadcastStatus::Sent).unwrap(), 1);
    assert_eq!(engine.mark_broadcast(&[ids[2]], BroadcastStatus::Failed).unwrap(), 1);
    // Sent is final.
    assert_eq!(engine.mark_broadcast(&[ids[0]], BroadcastStatus::Failed).unwrap(), 0);
    assert!(engine.pending_broadcasts(10).unwrap().is_empty());
}

#[test]
fn trace_stats_aggregate_status_type_and_duration() {
    let engine = StorageEngine::open_in_memory().unwrap();
    for (seq, ms) in [(1, Some(100)), (2, Some(300)), (3, None)] {
        let record = inserted(
            engine
                .insert_event(&new_event("trace-s", seq, task_created(&format!("task-{seq}"), "x")))
                .unwrap(),
        );
        if let Some(ms) = ms {
            engine
                .transition_event(&step(record.id, EventStatus::Pending, EventStatus::Processing))
                .unwrap();
            let to = if seq == 1 { EventStatus::Completed } else { EventStatus::Failed };
            let mut finish = step(record.id, EventStatus::Processing, to);
            finish.duration_ms = Some(ms);
            engine.transition_event(&finish).unwrap();
        }
    }

    let stats = engine.trace_stats("trace-s").unwrap();
    assert_eq!(stats.total_events, 3);
    assert_eq!(stats.count(EventStatus::Completed), 1);
    assert_eq!(stats.count(EventStatus::Failed), 1);
    assert_eq!(stats.count(EventStatus::Pending), 1);
    assert_eq!(stats.by_type.get("task_created"), Some(&3));
    assert_eq!(stats.total_duration_ms, 400);
    assert_eq!(stats.avg_duration_ms, Some(200.0));
    assert_eq!(stats.max_duration_ms, Some(300));
    assert_eq!(stats.success_rate(), Some(0.5));
    assert!(stats.first_event_at <= stats.last_event_at);

    let empty = engine.trace_stats("nope").unwrap();
    assert_eq!(empty.total_events, 0);
    assert_eq!(empty.avg_duration_ms, None);
}

#[test]
fn file_backed_reads_go_through_the_pool() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = StorageEngine::open(&dir.path().join("ledger.db")).expect("open file-backed storage");
    let record = inserted(
        engine
            .insert_event(&new_event("trace-f", 1, task_created("task-1", "x")))
            .unwrap(),
    );
    assert_eq!(engine.get_event(record.id).unwrap().unwrap().id, record.id);
    assert_eq!(engine.event_count().unwrap(), 1);
    engine
        .pool()
        .writer
        .with_conn(|conn| {
            assert!(causeway_storage::pool::pragmas::verify_wal_mode(conn)?);
            Ok(())
        })
        .unwrap();
}
