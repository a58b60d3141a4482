//! # causeway-core
//!
//! Foundation crate for the Causeway event ledger.
//! Defines the ledger types, typed payload registry, vector clock, checksums,
//! errors, config, and the storage traits every other crate builds on.

pub mod checksum;
pub mod clock;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use clock::VectorClock;
pub use config::CausewayConfig;
pub use errors::{CausewayError, CausewayResult};
pub use models::{
    BroadcastStatus, CompactionSummary, ConflictStrategy, EventId, EventPayload, EventRecord,
    EventStatus, EventType,
};
