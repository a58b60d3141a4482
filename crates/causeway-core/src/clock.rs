//! Vector clock carried by client-originated events.
//!
//! Each client keeps its own logical counter. Counters count events, they
//! never encode wall-clock time.
//!
//! # Examples
//!
//! ```
//! use causeway_core::VectorClock;
//!
//! let mut a = VectorClock::new();
//! a.increment("phone");
//! a.increment("phone");
//!
//! let mut b = VectorClock::new();
//! b.increment("laptop");
//!
//! assert!(a.concurrent_with(&b));
//!
//! a.merge(&b);
//! assert_eq!(a.get("phone"), 2);
//! assert_eq!(a.get("laptop"), 1);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A vector clock mapping client ids to logical counters.
///
/// Backed by a `BTreeMap` so the serialized form is stable across writes.
/// A client absent from the map has an implicit counter of 0.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorClock {
    clocks: BTreeMap<String, u64>,
}

impl VectorClock {
    /// Create an empty vector clock.
    pub fn new() -> Self {
        Self {
            clocks: BTreeMap::new(),
        }
    }

    /// Build a clock from `(client, counter)` pairs.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            clocks: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Increment the counter for the given client by 1.
    pub fn increment(&mut self, client_id: &str) {
        let entry = self.clocks.entry(client_id.to_string()).or_insert(0);
        *entry += 1;
    }

    /// Current counter for a client (0 if absent).
    pub fn get(&self, client_id: &str) -> u64 {
        self.clocks.get(client_id).copied().unwrap_or(0)
    }

    /// Component-wise max.
    pub fn merge(&mut self, other: &Self) {
        for (client_id, &other_val) in &other.clocks {
            let entry = self.clocks.entry(client_id.clone()).or_insert(0);
            *entry = (*entry).max(other_val);
        }
    }

    /// Returns true if `self` happens-before `other`.
    ///
    /// Every entry in `self` is ≤ the matching entry in `other`, and at least
    /// one is strictly less.
    pub fn happens_before(&self, other: &Self) -> bool {
        let mut at_least_one_less = false;

        for (client_id, &self_val) in &self.clocks {
            let other_val = other.get(client_id);
            if self_val > other_val {
                return false;
            }
            if self_val < other_val {
                at_least_one_less = true;
            }
        }

        // Entries only `other` carries count as 0 on our side.
        for (client_id, &other_val) in &other.clocks {
            if !self.clocks.contains_key(client_id) && other_val > 0 {
                at_least_one_less = true;
            }
        }

        at_least_one_less
    }

    /// Returns true if `self` dominates `other` (`other` happens-before `self`).
    pub fn dominates(&self, other: &Self) -> bool {
        other.happens_before(self)
    }

    /// Neither clock happens-before the other and they are not equal.
    pub fn concurrent_with(&self, other: &Self) -> bool {
        !self.happens_before(other) && !other.happens_before(self) && !self.same_as(other)
    }

    /// Equality that ignores explicit zero entries (`{A:0}` equals `{}`).
    pub fn same_as(&self, other: &Self) -> bool {
        self.clocks
            .keys()
            .chain(other.clocks.keys())
            .all(|client| self.get(client) == other.get(client))
    }

    /// Client ids present in this clock, in sorted order.
    pub fn clients(&self) -> Vec<&str> {
        self.clocks.keys().map(|s| s.as_str()).collect()
    }

    /// Iterate over `(client, counter)` pairs in client order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.clocks.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Sum of all counters. Used as a coarse causal depth.
    pub fn total(&self) -> u64 {
        self.clocks.values().sum()
    }

    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }
}
