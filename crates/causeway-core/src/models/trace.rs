use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EventId, EventStatus, EventType};

/// One row of a user-facing chronological trace view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub event_id: EventId,
    pub sequence_num: i64,
    pub event_type: EventType,
    pub status: EventStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub review_required: bool,
}

/// Aggregate processing statistics for one trace.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TraceStats {
    pub trace_id: String,
    pub total_events: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_type: BTreeMap<String, u64>,
    pub total_duration_ms: i64,
    pub avg_duration_ms: Option<f64>,
    pub max_duration_ms: Option<i64>,
    pub first_event_at: Option<DateTime<Utc>>,
    pub last_event_at: Option<DateTime<Utc>>,
}

impl TraceStats {
    pub fn count(&self, status: EventStatus) -> u64 {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }

    /// Completed / (completed + failed); `None` until something finished.
    pub fn success_rate(&self) -> Option<f64> {
        let completed = self.count(EventStatus::Completed);
        let failed = self.count(EventStatus::Failed);
        let finished = completed + failed;
        (finished > 0).then(|| completed as f64 / finished as f64)
    }
}
