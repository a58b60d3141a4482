//! Compactor: retention-driven summarize-then-delete.
//!
//! A run selects the oldest records past their status's retention window,
//! aggregates them into a [`CompactionSummary`], and (unless it is a dry run)
//! writes the summary and deletes the batch in one transaction. A failed
//! run rolls back completely and leaves a failed summary behind for audit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};
use uuid::Uuid;

use causeway_core::config::RetentionConfig;
use causeway_core::errors::{CausewayResult, CompactionError};
use causeway_core::models::{CompactionSummary, EventId, RetentionCutoffs};
use causeway_core::traits::ICompactionStorage;

pub struct Compactor {
    storage: Arc<dyn ICompactionStorage>,
    retention: RetentionConfig,
    /// Guard: only one compaction can run at a time.
    is_running: Arc<AtomicBool>,
}

impl Compactor {
    pub fn new(storage: Arc<dyn ICompactionStorage>, retention: RetentionConfig) -> Self {
        Self {
            storage,
            retention,
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    /// Compact up to `batch_size` records (the configured batch size when
    /// `None`) using retention cutoffs relative to now.
    pub fn compact(&self, dry_run: bool, batch_size: Option<usize>) -> CausewayResult<CompactionSummary> {
        self.compact_at(Utc::now(), dry_run, batch_size)
    }

    /// Like [`Compactor::compact`], with retention measured from `now`.
    #[instrument(skip(self))]
    pub fn compact_at(
        &self,
        now: DateTime<Utc>,
        dry_run: bool,
        batch_size: Option<usize>,
    ) -> CausewayResult<CompactionSummary> {
        let run_id = Uuid::new_v4().to_string();

        if self
            .is_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CompactionError::CompactionFailure {
                run_id,
                reason: "compaction already in progress".to_string(),
            }
            .into());
        }

        let result = self.run(&run_id, now, dry_run, batch_size);

        self.is_running.store(false, Ordering::SeqCst);
        result
    }

    /// Dry run with the configured batch size.
    pub fn estimate(&self) -> CausewayResult<CompactionSummary> {
        self.compact(true, None)
    }

    /// Most recent summaries first.
    pub fn history(&self, limit: usize) -> CausewayResult<Vec<CompactionSummary>> {
        self.storage.compaction_history(limit)
    }

    fn run(
        &self,
        run_id: &str,
        now: DateTime<Utc>,
        dry_run: bool,
        batch_size: Option<usize>,
    ) -> CausewayResult<CompactionSummary> {
        let limit = batch_size.unwrap_or(self.retention.batch_size).max(1);
        let cutoffs = RetentionCutoffs::from_config(&self.retention, now);
        let candidates = self.storage.select_compaction_candidates(&cutoffs, limit)?;
        let summary = CompactionSummary::from_candidates(run_id, &candidates, dry_run);

        if dry_run || candidates.is_empty() {
            info!(
                run_id,
                dry_run,
                eligible = summary.total_events_compacted,
                "compaction nothing deleted"
            );
            return Ok(summary);
        }

        let ids: Vec<EventId> = candidates.iter().map(|c| c.id).collect();
        match self.storage.commit_compaction(&summary, &ids) {
            Ok(committed) => {
                info!(
                    run_id,
                    summary_id = ?committed.id,
                    events_deleted = committed.events_deleted,
                    "compaction committed"
                );
                Ok(committed)
            }
            Err(e) => {
                error!(run_id, error = %e, "compaction rolled back");
                let failed = summary.into_failed(e.to_string());
                if let Err(record_err) = self.storage.record_summary(&failed) {
                    error!(run_id, error = %record_err, "failed to record failed compaction summary");
                }
                Err(e)
            }
        }
    }
}
