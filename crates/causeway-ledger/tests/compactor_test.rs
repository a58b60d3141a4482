//! Compactor runs: the large batch, dry runs, rollback on failure, history.

use causeway_core::errors::CompactionError;
use causeway_core::models::EventSubmission;
use causeway_core::traits::ILedgerStorage;
use causeway_core::CausewayError;
use causeway_ledger::CausewayRuntime;
use test_fixtures::task_created;

/// Bulk-insert `count` completed records dated well past every retention window.
fn seed_aged_completed(rt: &CausewayRuntime, count: i64) {
    rt.storage
        .pool()
        .writer
        .with_conn(|conn| {
            conn.execute(
                r#"WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < ?1)
                   INSERT INTO event_ledger (
                       trace_id, sequence_num, event_type, schema_version, payload,
                       target_id, checksum, status, created_at, duration_ms, broadcast_status
                   )
                   SELECT 'trace-old', i, 'task_completed', 1,
                          '{"type":"task_completed","task_id":"task-old"}',
                          'task-old', 'seeded', 'completed',
                          '2024-01-01T00:00:00.000000Z', 25, 'sent'
                   FROM n"#,
                rusqlite::params![count],
            )
            .unwrap();
            Ok(())
        })
        .unwrap();
}

fn log_recent(rt: &CausewayRuntime, n: usize) {
    for i in 0..n {
        rt.ledger
            .log(EventSubmission::server("trace-new", task_created(&format!("task-{i}"), "fresh")))
            .unwrap();
    }
}

#[test]
fn compacts_ten_thousand_aged_records_into_one_summary() {
    let rt = CausewayRuntime::in_memory().unwrap();
    seed_aged_completed(&rt, 10_000);
    log_recent(&rt, 3);
    assert_eq!(rt.storage.event_count().unwrap(), 10_003);

    let summary = rt.compactor.compact(false, None).unwrap();

    assert!(summary.success);
    assert!(!summary.dry_run);
    assert!(summary.id.is_some());
    assert_eq!(summary.total_events_compacted, 10_000);
    assert_eq!(summary.events_deleted, 10_000);
    assert_eq!(summary.events_by_status.get("completed"), Some(&10_000));
    assert_eq!(summary.events_by_type.get("task_completed"), Some(&10_000));
    assert_eq!(summary.total_duration_ms, 250_000);
    assert_eq!(summary.avg_duration_ms, Some(25.0));
    assert_eq!(rt.storage.event_count().unwrap(), 3);

    let history = rt.compactor.history(10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].run_id, summary.run_id);
    assert_eq!(history[0].events_deleted, 10_000);
}

#[test]
fn batch_size_caps_a_run() {
    let rt = CausewayRuntime::in_memory().unwrap();
    seed_aged_completed(&rt, 50);

    let first = rt.compactor.compact(false, Some(20)).unwrap();
    assert_eq!(first.events_deleted, 20);
    assert_eq!(rt.storage.event_count().unwrap(), 30);

    let second = rt.compactor.compact(false, Some(100)).unwrap();
    assert_eq!(second.events_deleted, 30);
    assert_eq!(rt.storage.event_count().unwrap(), 0);
    assert_eq!(rt.compactor.history(10).unwrap().len(), 2);
}

#[test]
fn dry_run_never_deletes() {
    let rt = CausewayRuntime::in_memory().unwrap();
    seed_aged_completed(&rt, 40);

    let summary = rt.compactor.compact(true, None).unwrap();
    assert!(summary.dry_run);
    assert_eq!(summary.total_events_compacted, 40);
    assert_eq!(summary.events_deleted, 0);
    assert_eq!(rt.storage.event_count().unwrap(), 40);
    assert!(rt.compactor.history(10).unwrap().is_empty());

    let estimate = rt.compactor.estimate().unwrap();
    assert_eq!(estimate.total_events_compacted, 40);
    assert_eq!(rt.storage.event_count().unwrap(), 40);
}

#[test]
fn recent_records_are_not_eligible() {
    let rt = CausewayRuntime::in_memory().unwrap();
    log_recent(&rt, 5);

    let summary = rt.compactor.compact(false, None).unwrap();
    assert_eq!(summary.total_events_compacted, 0);
    assert_eq!(summary.events_deleted, 0);
    assert_eq!(rt.storage.event_count().unwrap(), 5);
    assert!(rt.compactor.history(10).unwrap().is_empty());
}

#[test]
fn failed_delete_rolls_back_and_records_failure() {
    let rt = CausewayRuntime::in_memory().unwrap();
    seed_aged_completed(&rt, 10);
    rt.storage
        .pool()
        .writer
        .with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER block_delete BEFORE DELETE ON event_ledger
                 BEGIN SELECT RAISE(ABORT, 'boom'); END;",
            )
            .unwrap();
            Ok(())
        })
        .unwrap();

    let err = rt.compactor.compact(false, None).unwrap_err();
    assert!(matches!(
        err,
        CausewayError::CompactionError(CompactionError::CompactionFailure { .. })
    ));
    assert_eq!(rt.storage.event_count().unwrap(), 10);

    let history = rt.compactor.history(10).unwrap();
    assert_eq!(history.len(), 1);
    let failed = &history[0];
    assert!(!failed.success);
    assert_eq!(failed.events_deleted, 0);
    assert_eq!(failed.total_events_compacted, 10);
    assert!(failed.error_message.as_deref().unwrap().contains("boom"));
    assert!(!rt.compactor.is_running());
}
