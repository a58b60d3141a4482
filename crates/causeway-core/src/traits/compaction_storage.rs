use crate::errors::CausewayResult;
use crate::models::{CompactionCandidate, CompactionSummary, EventId, RetentionCutoffs};

/// Persistence for retention-driven compaction and the `compaction_summary`
/// audit trail.
pub trait ICompactionStorage: Send + Sync {
    /// Up to `limit` records past their retention cutoff, oldest first.
    fn select_compaction_candidates(
        &self,
        cutoffs: &RetentionCutoffs,
        limit: usize,
    ) -> CausewayResult<Vec<CompactionCandidate>>;

    /// Insert `summary` and delete `ids` in one transaction. The returned
    /// summary carries its row id and the real `events_deleted`. On error
    /// nothing is committed.
    fn commit_compaction(
        &self,
        summary: &CompactionSummary,
        ids: &[EventId],
    ) -> CausewayResult<CompactionSummary>;

    /// Append a summary on its own (failed runs).
    fn record_summary(&self, summary: &CompactionSummary) -> CausewayResult<i64>;

    /// Most recent summaries first.
    fn compaction_history(&self, limit: usize) -> CausewayResult<Vec<CompactionSummary>>;
}
