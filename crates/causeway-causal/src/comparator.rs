//! Vector clock advancement and the four-way causal comparison.

use serde::{Deserialize, Serialize};

use causeway_core::VectorClock;

/// Causal relation of `a` relative to `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockOrdering {
    /// `a` happens-before `b`.
    Before,
    /// `a` happens-after `b`.
    After,
    /// Neither dominates: a genuine conflict.
    Concurrent,
    Equal,
}

impl ClockOrdering {
    /// The relation seen from the other side.
    pub fn reverse(self) -> Self {
        match self {
            ClockOrdering::Before => ClockOrdering::After,
            ClockOrdering::After => ClockOrdering::Before,
            other => other,
        }
    }
}

/// Stateless clock operations.
pub struct ClockComparator;

impl ClockComparator {
    /// Copy `previous` (or start empty) and bump `client_id` by one.
    ///
    /// ```
    /// use causeway_causal::ClockComparator;
    ///
    /// let first = ClockComparator::advance("A", None);
    /// let second = ClockComparator::advance("A", Some(&first));
    /// assert_eq!(first.get("A"), 1);
    /// assert_eq!(second.get("A"), 2);
    /// ```
    pub fn advance(client_id: &str, previous: Option<&VectorClock>) -> VectorClock {
        let mut next = previous.cloned().unwrap_or_default();
        next.increment(client_id);
        next
    }

    /// Compare two clocks by dominance. Missing clients count as 0.
    pub fn compare(a: &VectorClock, b: &VectorClock) -> ClockOrdering {
        let mut a_greater = false;
        let mut b_greater = false;

        for client in a.clients().into_iter().chain(b.clients()) {
            let (av, bv) = (a.get(client), b.get(client));
            if av > bv {
                a_greater = true;
            } else if bv > av {
                b_greater = true;
            }
            if a_greater && b_greater {
                return ClockOrdering::Concurrent;
            }
        }

        match (a_greater, b_greater) {
            (true, false) => ClockOrdering::After,
            (false, true) => ClockOrdering::Before,
            (false, false) => ClockOrdering::Equal,
            (true, true) => ClockOrdering::Concurrent,
        }
    }

    /// Compare two optional clocks. A record without a clock has no causal
    /// relation to anything, so the result is `None`.
    pub fn compare_opt(a: Option<&VectorClock>, b: Option<&VectorClock>) -> Option<ClockOrdering> {
        match (a, b) {
            (Some(a), Some(b)) => Some(Self::compare(a, b)),
            _ => None,
        }
    }
}
