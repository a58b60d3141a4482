//! Hand-off of completed records to the broadcast layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use causeway_core::errors::CausewayResult;
use causeway_core::models::{BroadcastStatus, EventEnvelope, EventId};
use causeway_core::traits::ILedgerStorage;

/// A record waiting for delivery, with the id needed to acknowledge it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingBroadcast {
    pub event_id: EventId,
    pub envelope: EventEnvelope,
}

pub struct BroadcastQueue {
    storage: Arc<dyn ILedgerStorage>,
    batch_size: usize,
}

impl BroadcastQueue {
    pub fn new(storage: Arc<dyn ILedgerStorage>, batch_size: usize) -> Self {
        Self {
            storage,
            batch_size: batch_size.max(1),
        }
    }

    /// Completed, undelivered records ordered by sequence number. `None`
    /// uses the configured batch size.
    pub fn pending(&self, limit: Option<usize>) -> CausewayResult<Vec<PendingBroadcast>> {
        let records = self
            .storage
            .pending_broadcasts(limit.unwrap_or(self.batch_size))?;
        Ok(records
            .iter()
            .map(|r| PendingBroadcast {
                event_id: r.id,
                envelope: EventEnvelope::from(r),
            })
            .collect())
    }

    pub fn mark_sent(&self, ids: &[EventId]) -> CausewayResult<usize> {
        self.mark(ids, BroadcastStatus::Sent)
    }

    pub fn mark_failed(&self, ids: &[EventId]) -> CausewayResult<usize> {
        self.mark(ids, BroadcastStatus::Failed)
    }

    /// Record a delivery attempt. Returns the number of rows changed;
    /// records already `sent` are left alone.
    pub fn mark(&self, ids: &[EventId], status: BroadcastStatus) -> CausewayResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let changed = self.storage.mark_broadcast(ids, status)?;
        debug!(requested = ids.len(), changed, status = status.as_str(), "broadcast status updated");
        Ok(changed)
    }
}
