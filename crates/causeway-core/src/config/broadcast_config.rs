use serde::{Deserialize, Serialize};

use super::defaults;

/// Broadcast hand-off configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Completed records fetched per batch.
    pub batch_size: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::DEFAULT_BROADCAST_BATCH_SIZE,
        }
    }
}
