use serde::{Deserialize, Serialize};

use crate::models::ConflictStrategy;

/// Conflict resolution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictConfig {
    /// Strategy applied when the caller does not pick one.
    pub default_strategy: ConflictStrategy,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            default_strategy: ConflictStrategy::LastWriteWins,
        }
    }
}
