//! Sequence assigners.
//!
//! [`StoreSequencer`] serializes through the database and is safe across
//! processes sharing one file. [`InProcessSequencer`] is a mutex-guarded
//! counter for single-node deployments; it is seeded from the store's
//! high-water mark at startup.

mod in_process;
mod store;

pub use in_process::InProcessSequencer;
pub use store::StoreSequencer;
