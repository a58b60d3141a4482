//! Per-status retention windows for ledger compaction.
//!
//! # Examples
//!
//! ```
//! use causeway_core::config::RetentionConfig;
//!
//! let config = RetentionConfig::default();
//! assert_eq!(config.completed_days, 30);
//! assert_eq!(config.failed_days, 90);
//! assert_eq!(config.pending_days, 7);
//! ```

use serde::{Deserialize, Serialize};

use super::defaults;

/// Retention windows in days, one per lifecycle status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub completed_days: u32,
    pub failed_days: u32,
    /// Pending records older than this are considered stale.
    pub pending_days: u32,
    pub processing_days: u32,
    pub skipped_days: u32,
    /// Default number of records compacted per run.
    pub batch_size: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            completed_days: defaults::DEFAULT_COMPLETED_RETENTION_DAYS,
            failed_days: defaults::DEFAULT_FAILED_RETENTION_DAYS,
            pending_days: defaults::DEFAULT_PENDING_RETENTION_DAYS,
            processing_days: defaults::DEFAULT_PROCESSING_RETENTION_DAYS,
            skipped_days: defaults::DEFAULT_SKIPPED_RETENTION_DAYS,
            batch_size: defaults::DEFAULT_COMPACTION_BATCH_SIZE,
        }
    }
}
