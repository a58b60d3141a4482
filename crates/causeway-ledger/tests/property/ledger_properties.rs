//! Property tests: idempotent logging and the lifecycle state machine.

use proptest::prelude::*;

use causeway_core::models::{EventStatus, EventSubmission};
use causeway_core::traits::ILedgerStorage;
use causeway_ledger::CausewayRuntime;
use test_fixtures::task_created;

#[derive(Debug, Clone, Copy)]
enum Op {
    Start,
    Complete,
    Fail,
    Skip,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Start),
        Just(Op::Complete),
        Just(Op::Fail),
        Just(Op::Skip)
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn repeated_key_writes_one_row(key in "[a-z0-9-]{1,24}", repeats in 2usize..5) {
        let rt = CausewayRuntime::in_memory().unwrap();
        let mut ids = Vec::new();
        for _ in 0..repeats {
            let outcome = rt
                .ledger
                .log(
                    EventSubmission::server("trace-p", task_created("task-1", "x"))
                        .with_idempotency_key(key.clone()),
                )
                .unwrap();
            ids.push(outcome.record().id);
        }
        prop_assert!(ids.windows(2).all(|w| w[0] == w[1]));
        prop_assert_eq!(rt.storage.event_count().unwrap(), 1);
    }

    #[test]
    fn terminal_status_never_changes(ops in prop::collection::vec(op(), 1..8)) {
        let rt = CausewayRuntime::in_memory().unwrap();
        let mut current = rt
            .ledger
            .log(EventSubmission::server("trace-p", task_created("task-1", "x")))
            .unwrap()
            .into_record();

        for op in ops {
            let before = current.status;
            let result = match op {
                Op::Start => rt.ledger.start(&current),
                Op::Complete => rt.ledger.complete(&current),
                Op::Fail => rt.ledger.fail(&current, "boom"),
                Op::Skip => rt.ledger.skip(&current, "skip"),
            };
            match result {
                Ok(next) => {
                    prop_assert!(!before.is_terminal());
                    prop_assert!(before.can_transition_to(next.status));
                    current = next;
                }
                Err(_) => {
                    let stored = rt.ledger.get(current.id).unwrap().unwrap();
                    prop_assert_eq!(stored.status, before);
                }
            }
        }

        let stored = rt.ledger.get(current.id).unwrap().unwrap();
        prop_assert_eq!(stored.status, current.status);
        if stored.status == EventStatus::Completed {
            prop_assert_eq!(stored.last_applied_id, Some(stored.id));
        }
    }
}
