//! Pairwise conflict detection within a logical target.
//!
//! Quadratic by construction. Callers only pass a replay window or a single
//! target's history, never the whole ledger.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use causeway_core::constants::MAX_CONFLICT_WINDOW;
use causeway_core::models::{ConflictPair, EventRecord};

use crate::comparator::{ClockComparator, ClockOrdering};

/// Report every vector-clock concurrent pair among records that share a
/// `target_id`. Records without a clock or target, and records already
/// superseded by an earlier resolution, are ignored.
pub fn detect_conflicts(records: &[EventRecord]) -> Vec<ConflictPair> {
    let mut by_target: BTreeMap<&str, Vec<&EventRecord>> = BTreeMap::new();
    for record in records {
        if record.vector_clock.is_none() || record.superseded_by.is_some() {
            continue;
        }
        if let Some(target) = record.target_id.as_deref() {
            by_target.entry(target).or_default().push(record);
        }
    }

    let mut conflicts = Vec::new();
    for (target, mut group) in by_target {
        if group.len() > MAX_CONFLICT_WINDOW {
            warn!(
                target_id = target,
                size = group.len(),
                window = MAX_CONFLICT_WINDOW,
                "conflict window too large, checking most recent records only"
            );
            group.sort_by_key(|r| r.sequence_num);
            let excess = group.len() - MAX_CONFLICT_WINDOW;
            group.drain(..excess);
        }

        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                let (a, b) = (group[i], group[j]);
                let ordering = ClockComparator::compare_opt(
                    a.vector_clock.as_ref(),
                    b.vector_clock.as_ref(),
                );
                if ordering == Some(ClockOrdering::Concurrent) {
                    let (left, right) = if a.id <= b.id { (a.id, b.id) } else { (b.id, a.id) };
                    conflicts.push(ConflictPair {
                        target_id: target.to_string(),
                        left,
                        right,
                    });
                }
            }
        }
    }

    if !conflicts.is_empty() {
        debug!(count = conflicts.len(), "detected concurrent record pairs");
    }
    conflicts
}
