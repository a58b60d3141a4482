// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "causeway.db";
pub const DEFAULT_READ_POOL_SIZE: usize = 4;
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;

// --- Sequence ---
pub const DEFAULT_SEQUENCE_MAX_RETRIES: u32 = 3;

// --- Retention (days) ---
pub const DEFAULT_COMPLETED_RETENTION_DAYS: u32 = 30;
pub const DEFAULT_FAILED_RETENTION_DAYS: u32 = 90;
pub const DEFAULT_PENDING_RETENTION_DAYS: u32 = 7;
pub const DEFAULT_PROCESSING_RETENTION_DAYS: u32 = 7;
pub const DEFAULT_SKIPPED_RETENTION_DAYS: u32 = 30;
pub const DEFAULT_COMPACTION_BATCH_SIZE: usize = 10_000;

// --- Dedup ---
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.75;
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.90;
pub const DEFAULT_TITLE_WEIGHT: f64 = 0.7;
pub const DEFAULT_DESCRIPTION_WEIGHT: f64 = 0.3;
pub const DEFAULT_CANDIDATE_LIMIT: usize = 200;

// --- Broadcast ---
pub const DEFAULT_BROADCAST_BATCH_SIZE: usize = 100;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = true;
