//! # causeway-causal
//!
//! Causal ordering for ledger records.
//!
//! - [`ClockComparator`]: advance and compare per-client vector clocks
//! - [`detect_conflicts`]: pairwise concurrency check within one target
//! - [`ConflictResolver`]: pick a winner under a [`ConflictStrategy`]
//! - [`TemporalReorderer`]: loss-free causal ordering of replayed batches
//!
//! [`ConflictStrategy`]: causeway_core::ConflictStrategy

pub mod comparator;
pub mod conflict;
pub mod reorder;
pub mod resolver;

pub use comparator::{ClockComparator, ClockOrdering};
pub use conflict::detect_conflicts;
pub use reorder::TemporalReorderer;
pub use resolver::ConflictResolver;
