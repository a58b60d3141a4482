//! Causal reordering of replayed batches.
//!
//! Records carrying a vector clock are ordered by repeatedly extracting one
//! that no remaining record happens-before (Kahn's algorithm over the
//! happens-before relation, picking the earliest input position first so
//! that an already-sorted batch comes back untouched). Clockless server
//! events are ordered by `(sequence_num, created_at)`. The two runs are then
//! interleaved on the same key.
//!
//! The output always has exactly the input's records, no more and no fewer.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use causeway_core::models::EventRecord;

pub struct TemporalReorderer;

impl TemporalReorderer {
    /// Produce a causally valid, length-preserving ordering of `records`.
    pub fn reorder(records: Vec<EventRecord>) -> Vec<EventRecord> {
        let input_len = records.len();
        let (clocked, mut clockless): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|r| r.vector_clock.is_some());

        let clocked = Self::causal_sort(clocked);
        clockless.sort_by(|a, b| Self::key(a).cmp(&Self::key(b)));

        let merged = Self::interleave(clocked, clockless);
        debug_assert_eq!(merged.len(), input_len, "reorder must not drop records");
        debug!(count = merged.len(), "reordered batch");
        merged
    }

    /// True when no record is preceded by a record it happens-before.
    pub fn is_causally_sorted(records: &[EventRecord]) -> bool {
        for (i, later) in records.iter().enumerate() {
            let Some(later_clock) = later.vector_clock.as_ref() else {
                continue;
            };
            for earlier in &records[..i] {
                if let Some(earlier_clock) = earlier.vector_clock.as_ref() {
                    if later_clock.happens_before(earlier_clock) {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn key(record: &EventRecord) -> (i64, DateTime<Utc>) {
        (record.sequence_num, record.created_at)
    }

    fn causal_sort(records: Vec<EventRecord>) -> Vec<EventRecord> {
        let n = records.len();
        if n < 2 {
            return records;
        }

        let mut preds = vec![0usize; n];
        let mut succs: Vec<Vec<usize>> = vec![Vec::new(); n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                if let (Some(ci), Some(cj)) = (&records[i].vector_clock, &records[j].vector_clock) {
                    if ci.happens_before(cj) {
                        succs[i].push(j);
                        preds[j] += 1;
                    }
                }
            }
        }

        let mut emitted = vec![false; n];
        let mut order = Vec::with_capacity(n);
        while order.len() < n {
            match (0..n).find(|&i| !emitted[i] && preds[i] == 0) {
                Some(i) => {
                    emitted[i] = true;
                    order.push(i);
                    for &s in &succs[i] {
                        preds[s] -= 1;
                    }
                }
                None => {
                    // Only reachable with inconsistent clocks; fall back to the
                    // total order so the loop always terminates.
                    let mut rest: Vec<usize> = (0..n).filter(|&i| !emitted[i]).collect();
                    warn!(remaining = rest.len(), "causal cycle in batch, ordering by sequence");
                    rest.sort_by(|&a, &b| Self::key(&records[a]).cmp(&Self::key(&records[b])));
                    for i in rest {
                        emitted[i] = true;
                        order.push(i);
                    }
                }
            }
        }

        let mut slots: Vec<Option<EventRecord>> = records.into_iter().map(Some).collect();
        order.into_iter().filter_map(|i| slots[i].take()).collect()
    }

    fn interleave(clocked: Vec<EventRecord>, clockless: Vec<EventRecord>) -> Vec<EventRecord> {
        let mut out = Vec::with_capacity(clocked.len() + clockless.len());
        let mut a = clocked.into_iter().peekable();
        let mut b = clockless.into_iter().peekable();

        loop {
            let take_clockless = match (a.peek(), b.peek()) {
                (Some(x), Some(y)) => Self::key(y).cmp(&Self::key(x)) == Ordering::Less,
                (Some(_), None) => false,
                (None, Some(_)) => true,
                (None, None) => break,
            };
            let next = if take_clockless { b.next() } else { a.next() };
            out.extend(next);
        }
        out
    }
}
