//! Strategy-driven resolution of a conflicting pair.
//!
//! Pure: returns a [`Resolution`] describing who wins. Persisting the
//! outcome (superseding the loser, updating `last_applied_id`, flagging for
//! review) is the caller's job.

use std::cmp::Ordering;

use tracing::warn;

use causeway_core::models::{ConflictStrategy, EventRecord, Resolution};

pub struct ConflictResolver;

impl ConflictResolver {
    /// Resolve two concurrent records.
    ///
    /// `winner` is `None` only under [`ConflictStrategy::Manual`].
    pub fn resolve(a: &EventRecord, b: &EventRecord, strategy: ConflictStrategy) -> Resolution {
        let pick = |a_wins: bool| {
            if a_wins {
                (a.id, b.id)
            } else {
                (b.id, a.id)
            }
        };

        let (winner, loser, review_required) = match strategy {
            ConflictStrategy::ServerWins => {
                let (w, l) = pick(a.id < b.id);
                (Some(w), Some(l), false)
            }
            ConflictStrategy::ClientWins => {
                let (w, l) = pick(a.id > b.id);
                (Some(w), Some(l), false)
            }
            ConflictStrategy::LastWriteWins => {
                let (w, l) = pick(Self::later_write(a, b) == Ordering::Greater);
                (Some(w), Some(l), false)
            }
            ConflictStrategy::Merge => {
                warn!(
                    left = a.id,
                    right = b.id,
                    "merge strategy has no field-level semantics, using last-write-wins and flagging for review"
                );
                let (w, l) = pick(Self::later_write(a, b) == Ordering::Greater);
                (Some(w), Some(l), true)
            }
            ConflictStrategy::Manual => (None, None, true),
        };

        Resolution {
            strategy,
            winner,
            loser,
            review_required,
        }
    }

    /// Cross-reference note stored on a record that needs review.
    pub fn review_message(record: &EventRecord, other: &EventRecord, strategy: ConflictStrategy) -> String {
        format!(
            "concurrent with event #{} (seq {}) on {}; {} requires manual review",
            other.id,
            other.sequence_num,
            record.target_id.as_deref().unwrap_or("unknown target"),
            strategy
        )
    }

    /// Order by `created_at`, then sequence number, then id, so ties still
    /// produce a deterministic winner.
    fn later_write(a: &EventRecord, b: &EventRecord) -> Ordering {
        a.created_at
            .cmp(&b.created_at)
            .then(a.sequence_num.cmp(&b.sequence_num))
            .then(a.id.cmp(&b.id))
    }
}
