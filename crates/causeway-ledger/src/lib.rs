//! # causeway-ledger
//!
//! The ledger façade and the components built on top of it.
//!
//! - [`LedgerService`]: idempotent logging, lifecycle transitions, trace queries, integrity checks
//! - [`ConflictCoordinator`]: detect and resolve concurrent edits on one target
//! - [`ReplayEngine`]: ingest an offline queue in causal order
//! - [`Compactor`]: retention-driven summarize-then-delete
//! - [`BroadcastQueue`]: hand completed records to the broadcast layer
//! - [`CausewayRuntime`]: composition root wiring all of the above

pub mod broadcast;
pub mod compactor;
pub mod conflict;
pub mod replay;
pub mod runtime;
pub mod service;
pub mod tracing_setup;

pub use broadcast::{BroadcastQueue, PendingBroadcast};
pub use compactor::Compactor;
pub use conflict::{ConflictCoordinator, ConflictOutcome};
pub use replay::{RejectedSubmission, ReplayEngine, ReplayReport};
pub use runtime::{CausewayRuntime, RuntimeOptions};
pub use service::{LedgerService, LogOutcome};
