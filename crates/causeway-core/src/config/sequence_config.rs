use serde::{Deserialize, Serialize};

use super::defaults;

/// Which exclusive counter backs sequence assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceBackend {
    /// High-water mark row in the store, bumped inside an immediate transaction.
    Store,
    /// Mutex-guarded counter seeded from the store. Single-node only.
    InProcess,
}

/// Sequence assignment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub backend: SequenceBackend,
    /// Retries on `SequenceConflict` before the error reaches the caller.
    pub max_retries: u32,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            backend: SequenceBackend::Store,
            max_retries: defaults::DEFAULT_SEQUENCE_MAX_RETRIES,
        }
    }
}
