/// Causeway system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Separator used between normalized fields when building origin hashes.
pub const ORIGIN_HASH_SEPARATOR: &str = "|";

/// Maximum number of ids bound into a single `IN (...)` clause.
pub const MAX_SQL_IN_CHUNK: usize = 500;

/// Upper bound on records pulled into one conflict detection window.
pub const MAX_CONFLICT_WINDOW: usize = 256;

/// Maximum depth followed when walking `parent_event_id` chains.
pub const MAX_CAUSAL_CHAIN_DEPTH: usize = 1_000;
