//! Property tests for clock comparison and replay ordering.

use std::collections::BTreeSet;

use proptest::prelude::*;

use causeway_causal::{ClockComparator, ClockOrdering, TemporalReorderer};
use causeway_core::models::EventRecord;
use causeway_core::VectorClock;
use test_fixtures::{clocked, record};

const CLIENTS: [&str; 3] = ["A", "B", "C"];

fn clock_strategy() -> impl Strategy<Value = VectorClock> {
    prop::collection::vec(0u64..4, CLIENTS.len()).prop_map(|counters| {
        VectorClock::from_entries(CLIENTS.iter().copied().zip(counters))
    })
}

/// A batch of mixed clocked and clockless records with unique ids and
/// shuffled sequence numbers.
fn batch_strategy() -> impl Strategy<Value = Vec<EventRecord>> {
    prop::collection::vec((prop::option::of(clock_strategy()), 0i64..50), 0..24).prop_map(
        |items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (clock, seq))| {
                    let id = i as i64 + 1;
                    match clock {
                        Some(c) => {
                            let mut r = clocked(id, seq, &[]);
                            r.vector_clock = Some(c);
                            r
                        }
                        None => record(id, seq),
                    }
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn compare_is_reflexive(a in clock_strategy()) {
        prop_assert_eq!(ClockComparator::compare(&a, &a), ClockOrdering::Equal);
    }

    #[test]
    fn compare_is_antisymmetric(a in clock_strategy(), b in clock_strategy()) {
        let ab = ClockComparator::compare(&a, &b);
        let ba = ClockComparator::compare(&b, &a);
        prop_assert_eq!(ab.reverse(), ba);
    }

    #[test]
    fn compare_agrees_with_happens_before(a in clock_strategy(), b in clock_strategy()) {
        let ordering = ClockComparator::compare(&a, &b);
        prop_assert_eq!(ordering == ClockOrdering::Before, a.happens_before(&b));
        prop_assert_eq!(ordering == ClockOrdering::After, b.happens_before(&a));
    }

    #[test]
    fn advance_always_moves_forward(a in clock_strategy(), idx in 0usize..3) {
        let next = ClockComparator::advance(CLIENTS[idx], Some(&a));
        prop_assert_eq!(ClockComparator::compare(&a, &next), ClockOrdering::Before);
    }

    #[test]
    fn reorder_preserves_every_record(batch in batch_strategy()) {
        let ids: BTreeSet<i64> = batch.iter().map(|r| r.id).collect();
        let len = batch.len();
        let ordered = TemporalReorderer::reorder(batch);
        prop_assert_eq!(ordered.len(), len);
        let out: BTreeSet<i64> = ordered.iter().map(|r| r.id).collect();
        prop_assert_eq!(out, ids);
    }

    #[test]
    fn reorder_output_is_causally_sorted(batch in batch_strategy()) {
        let ordered = TemporalReorderer::reorder(batch);
        prop_assert!(TemporalReorderer::is_causally_sorted(&ordered));
    }

    #[test]
    fn reorder_is_idempotent(batch in batch_strategy()) {
        let once = TemporalReorderer::reorder(batch);
        let ids: Vec<i64> = once.iter().map(|r| r.id).collect();
        let twice = TemporalReorderer::reorder(once);
        prop_assert_eq!(twice.iter().map(|r| r.id).collect::<Vec<_>>(), ids);
    }
}
