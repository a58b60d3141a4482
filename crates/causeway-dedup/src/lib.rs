//! # causeway-dedup
//!
//! Keeps distinct extraction events from creating the same domain record
//! twice. Exact matches are found through a content-derived origin hash;
//! near matches through weighted edit-distance similarity.

pub mod deduplicator;
pub mod hash;
pub mod normalize;
pub mod similarity;

pub use deduplicator::Deduplicator;
pub use hash::origin_hash;
pub use normalize::normalize;
