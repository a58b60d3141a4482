use serde::{Deserialize, Serialize};

use super::defaults;

/// Duplicate detection thresholds and weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Minimum weighted score for a candidate to be listed as similar.
    pub similarity_threshold: f64,
    /// Weighted score at or above which a candidate counts as a duplicate.
    pub duplicate_threshold: f64,
    pub title_weight: f64,
    pub description_weight: f64,
    /// Maximum candidates scored per check.
    pub candidate_limit: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: defaults::DEFAULT_SIMILARITY_THRESHOLD,
            duplicate_threshold: defaults::DEFAULT_DUPLICATE_THRESHOLD,
            title_weight: defaults::DEFAULT_TITLE_WEIGHT,
            description_weight: defaults::DEFAULT_DESCRIPTION_WEIGHT,
            candidate_limit: defaults::DEFAULT_CANDIDATE_LIMIT,
        }
    }
}
