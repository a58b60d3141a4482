use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{EventId, EventStatus, EventType};
use crate::config::RetentionConfig;

/// The columns compaction needs from each eligible record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactionCandidate {
    pub id: EventId,
    pub event_type: EventType,
    pub status: EventStatus,
    pub duration_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Absolute cutoffs derived from the retention windows at a point in time.
/// A record is eligible when its `created_at` is strictly older than the
/// cutoff for its status.
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionCutoffs {
    pub completed_before: DateTime<Utc>,
    pub failed_before: DateTime<Utc>,
    pub pending_before: DateTime<Utc>,
    pub processing_before: DateTime<Utc>,
    pub skipped_before: DateTime<Utc>,
}

impl RetentionCutoffs {
    pub fn from_config(config: &RetentionConfig, now: DateTime<Utc>) -> Self {
        let days = |d: u32| now - Duration::days(i64::from(d));
        Self {
            completed_before: days(config.completed_days),
            failed_before: days(config.failed_days),
            pending_before: days(config.pending_days),
            processing_before: days(config.processing_days),
            skipped_before: days(config.skipped_days),
        }
    }

    pub fn cutoff_for(&self, status: EventStatus) -> DateTime<Utc> {
        match status {
            EventStatus::Completed => self.completed_before,
            EventStatus::Failed => self.failed_before,
            EventStatus::Pending => self.pending_before,
            EventStatus::Processing => self.processing_before,
            EventStatus::Skipped => self.skipped_before,
        }
    }
}

/// Immutable rollup of one compaction batch. Written before the batch is
/// deleted and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactionSummary {
    /// Row id once persisted.
    pub id: Option<i64>,
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub dry_run: bool,
    pub events_by_type: BTreeMap<String, u64>,
    pub events_by_status: BTreeMap<String, u64>,
    pub total_events_compacted: u64,
    pub total_duration_ms: i64,
    pub avg_duration_ms: Option<f64>,
    pub earliest_event_at: Option<DateTime<Utc>>,
    pub latest_event_at: Option<DateTime<Utc>>,
    /// Rows actually removed. Always 0 for dry runs and failed runs.
    pub events_deleted: u64,
    pub success: bool,
    pub error_message: Option<String>,
}

impl CompactionSummary {
    /// Aggregate a batch of candidates. Nothing is deleted yet, so
    /// `events_deleted` starts at 0.
    pub fn from_candidates(run_id: &str, candidates: &[CompactionCandidate], dry_run: bool) -> Self {
        let mut events_by_type = BTreeMap::new();
        let mut events_by_status = BTreeMap::new();
        let mut total_duration_ms = 0i64;
        let mut timed = 0u64;
        let mut earliest: Option<DateTime<Utc>> = None;
        let mut latest: Option<DateTime<Utc>> = None;

        for c in candidates {
            *events_by_type
                .entry(c.event_type.as_str().to_string())
                .or_insert(0u64) += 1;
            *events_by_status
                .entry(c.status.as_str().to_string())
                .or_insert(0u64) += 1;
            if let Some(d) = c.duration_ms {
                total_duration_ms += d;
                timed += 1;
            }
            earliest = Some(earliest.map_or(c.created_at, |e| e.min(c.created_at)));
            latest = Some(latest.map_or(c.created_at, |l| l.max(c.created_at)));
        }

        Self {
            id: None,
            run_id: run_id.to_string(),
            created_at: Utc::now(),
            dry_run,
            events_by_type,
            events_by_status,
            total_events_compacted: candidates.len() as u64,
            total_duration_ms,
            avg_duration_ms: (timed > 0).then(|| total_duration_ms as f64 / timed as f64),
            earliest_event_at: earliest,
            latest_event_at: latest,
            events_deleted: 0,
            success: true,
            error_message: None,
        }
    }

    /// Copy of this summary marking the run as failed.
    pub fn into_failed(mut self, error: impl Into<String>) -> Self {
        self.id = None;
        self.success = false;
        self.events_deleted = 0;
        self.error_message = Some(error.into());
        self
    }
}
