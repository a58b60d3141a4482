//! Runtime wiring from config, the broadcast hand-off, dedup through the
//! runtime, and tracing initialization.

use std::collections::HashSet;

use causeway_core::config::SequenceBackend;
use causeway_core::models::{BroadcastStatus, DuplicateKind, EventStatus, EventSubmission};
use causeway_core::traits::ILedgerStorage;
use causeway_ledger::tracing_setup::{init_tracing, init_tracing_with_filter};
use causeway_ledger::{CausewayRuntime, RuntimeOptions};
use test_fixtures::task_created;

const IN_PROCESS_TOML: &str = r#"
[sequence]
backend = "in_process"

[conflict]
default_strategy = "server_wins"

[broadcast]
batch_size = 2
"#;

fn log_completed(rt: &CausewayRuntime, task: &str) -> i64 {
    let r = rt
        .ledger
        .log(EventSubmission::server("trace-b", task_created(task, "x")))
        .unwrap()
        .into_record();
    let r = rt.ledger.start(&r).unwrap();
    rt.ledger.complete(&r).unwrap().id
}

#[test]
fn runtime_applies_toml_config() {
    let rt = CausewayRuntime::new(RuntimeOptions {
        config_toml: Some(IN_PROCESS_TOML.to_string()),
        in_memory: true,
        ..Default::default()
    })
    .unwrap();

    assert_eq!(rt.config.sequence.backend, SequenceBackend::InProcess);
    assert_eq!(
        rt.conflicts.default_strategy(),
        causeway_core::ConflictStrategy::ServerWins
    );
    let seqs: Vec<i64> = (0..3)
        .map(|i| {
            rt.ledger
                .log(EventSubmission::server("t", task_created(&format!("task-{i}"), "x")))
                .unwrap()
                .record()
                .sequence_num
        })
        .collect();
    assert_eq!(seqs, vec![1, 2, 3]);
}

#[test]
fn invalid_config_is_rejected() {
    let result = CausewayRuntime::new(RuntimeOptions {
        config_toml: Some("[retention]\nbatch_size = 0\n".to_string()),
        in_memory: true,
        ..Default::default()
    });
    assert!(result.is_err());
}

#[test]
fn in_process_sequencer_resumes_after_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ledger.db");
    let open = || {
        CausewayRuntime::new(RuntimeOptions {
            db_path: Some(path.clone()),
            config_toml: Some(IN_PROCESS_TOML.to_string()),
            ..Default::default()
        })
        .unwrap()
    };

    {
        let rt = open();
        for i in 0..4 {
            rt.ledger
                .log(EventSubmission::server("t", task_created(&format!("task-{i}"), "x")))
                .unwrap();
        }
    }

    let rt = open();
    let next = rt
        .ledger
        .log(EventSubmission::server("t", task_created("task-9", "x")))
        .unwrap();
    assert_eq!(next.record().sequence_num, 5);
    assert_eq!(rt.storage.event_count().unwrap(), 5);
}

#[test]
fn broadcast_hands_out_completed_records_in_sequence_order() {
    let rt = CausewayRuntime::new(RuntimeOptions {
        config_toml: Some(IN_PROCESS_TOML.to_string()),
        in_memory: true,
        ..Default::default()
    })
    .unwrap();

    let first = log_completed(&rt, "task-1");
    rt.ledger
        .log(EventSubmission::server("trace-b", task_created("task-pending", "x")))
        .unwrap();
    let second = log_completed(&rt, "task-2");
    let third = log_completed(&rt, "task-3");

    // Configured batch size is 2.
    let batch = rt.broadcast.pending(None).unwrap();
    let ids: Vec<i64> = batch.iter().map(|p| p.event_id).collect();
    assert_eq!(ids, vec![first, second]);
    assert!(batch.iter().all(|p| p.envelope.status == EventStatus::Completed));
    assert!(batch[0].envelope.sequence_num < batch[1].envelope.sequence_num);

    assert_eq!(rt.broadcast.mark_sent(&ids).unwrap(), 2);
    assert_eq!(rt.broadcast.mark_failed(&[third]).unwrap(), 1);

    // Failed deliveries are not re-offered; sent is final.
    assert!(rt.broadcast.pending(Some(10)).unwrap().is_empty());
    assert_eq!(rt.broadcast.mark_failed(&[first]).unwrap(), 0);
    let stored = rt.ledger.get(first).unwrap().unwrap();
    assert_eq!(stored.broadcast_status, BroadcastStatus::Sent);
    assert_eq!(rt.broadcast.mark(&[], BroadcastStatus::Sent).unwrap(), 0);
}

#[test]
fn envelope_serializes_wire_shape() {
    let rt = CausewayRuntime::in_memory().unwrap();
    log_completed(&rt, "task-1");
    let pending = rt.broadcast.pending(None).unwrap();
    let json = serde_json::to_value(&pending[0].envelope).unwrap();

    assert_eq!(json["trace_id"], "trace-b");
    assert_eq!(json["event_type"], "task_created");
    assert_eq!(json["status"], "completed");
    assert_eq!(json["payload"]["type"], "task_created");
    assert!(json["checksum"].is_string());
    assert!(json.get("vector_clock").is_none());
}

#[test]
fn runtime_dedup_flags_exact_duplicates() {
    let rt = CausewayRuntime::in_memory().unwrap();
    rt.dedup
        .register("task-1", "household", "Clean bedroom", "", None)
        .unwrap();

    let check = rt.dedup.check_duplicate("clean   Bedroom", "", None, "household");
    assert_eq!(check.kind, DuplicateKind::Exact);
    assert_eq!(check.confidence, 1.0);
    assert_eq!(check.existing.unwrap().record_id, "task-1");
}

#[test]
fn tracing_init_is_idempotent() {
    let _ = init_tracing_with_filter("causeway=debug");
    assert!(!init_tracing_with_filter("causeway=debug"));
    assert!(!init_tracing());
}

#[tokio::test]
async fn ledger_calls_work_inside_an_async_runtime() {
    let rt = CausewayRuntime::in_memory().unwrap();
    let id = log_completed(&rt, "task-1");
    let pending = rt.broadcast.pending(None).unwrap();
    assert_eq!(pending[0].event_id, id);
    assert_eq!(rt.broadcast.mark_sent(&[id]).unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn async_tasks_log_concurrently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let rt = CausewayRuntime::new(RuntimeOptions {
        db_path: Some(dir.path().join("ledger.db")),
        ..Default::default()
    })
    .unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|worker| {
            let ledger = rt.ledger.clone();
            tokio::spawn(async move {
                (0..10)
                    .map(|i| {
                        ledger
                            .log(EventSubmission::server(
                                "trace-async",
                                task_created(&format!("task-{worker}-{i}"), "x"),
                            ))
                            .unwrap()
                            .record()
                            .sequence_num
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seqs = HashSet::new();
    for task in tasks {
        seqs.extend(task.await.unwrap());
    }
    assert_eq!(seqs, (1..=80).collect::<HashSet<i64>>());
}
