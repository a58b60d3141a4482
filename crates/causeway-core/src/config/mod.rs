//! Configuration, loaded from TOML. Every section falls back to its defaults.

mod broadcast_config;
mod conflict_config;
mod dedup_config;
pub mod defaults;
mod observability_config;
mod retention_config;
mod sequence_config;
mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use broadcast_config::BroadcastConfig;
pub use conflict_config::ConflictConfig;
pub use dedup_config::DedupConfig;
pub use observability_config::ObservabilityConfig;
pub use retention_config::RetentionConfig;
pub use sequence_config::{SequenceBackend, SequenceConfig};
pub use storage_config::StorageConfig;

use crate::errors::{CausewayError, CausewayResult};

/// Top-level configuration for a Causeway deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CausewayConfig {
    pub storage: StorageConfig,
    pub sequence: SequenceConfig,
    pub retention: RetentionConfig,
    pub conflict: ConflictConfig,
    pub dedup: DedupConfig,
    pub broadcast: BroadcastConfig,
    pub observability: ObservabilityConfig,
}

impl CausewayConfig {
    /// Parse a TOML document. Missing sections and fields keep their defaults.
    pub fn from_toml(s: &str) -> CausewayResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> CausewayResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CausewayError::ConfigError(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&raw)
    }

    /// Reject values that would break ledger invariants.
    pub fn validate(&self) -> CausewayResult<()> {
        if self.retention.batch_size == 0 {
            return Err(CausewayError::ConfigError(
                "retention.batch_size must be greater than 0".into(),
            ));
        }
        let d = &self.dedup;
        if !(0.0..=1.0).contains(&d.similarity_threshold)
            || !(0.0..=1.0).contains(&d.duplicate_threshold)
        {
            return Err(CausewayError::ConfigError(
                "dedup thresholds must be within [0, 1]".into(),
            ));
        }
        if d.similarity_threshold > d.duplicate_threshold {
            return Err(CausewayError::ConfigError(
                "dedup.similarity_threshold must not exceed dedup.duplicate_threshold".into(),
            ));
        }
        if (d.title_weight + d.description_weight - 1.0).abs() > 1e-6 {
            return Err(CausewayError::ConfigError(
                "dedup title_weight + description_weight must equal 1.0".into(),
            ));
        }
        Ok(())
    }
}
