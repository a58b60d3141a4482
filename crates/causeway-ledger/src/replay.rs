//! ReplayEngine: ingest an offline client's queued submissions.
//!
//! The network may deliver a queue out of order and may deliver it twice.
//! Each submission is logged idempotently, conflicts against the stored
//! history of every touched target are resolved, and the batch is returned
//! in causal order. A submission that fails validation is reported and
//! skipped; the rest of the queue still goes through.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use causeway_causal::TemporalReorderer;
use causeway_core::errors::{CausewayError, CausewayResult, LedgerError};
use causeway_core::models::payload::OfflineQueueReplayed;
use causeway_core::models::{EventId, EventPayload, EventRecord, EventSubmission, EventType};

use crate::conflict::{ConflictCoordinator, ConflictOutcome};
use crate::service::LedgerService;

/// What happened to one replayed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub client_id: String,
    /// Every submitted record, causally ordered, as stored after resolution.
    pub ordered: Vec<EventRecord>,
    pub created: usize,
    /// Submissions whose idempotency key was already in the ledger.
    pub existing: usize,
    pub conflicts: Vec<ConflictOutcome>,
    /// Submissions refused by validation, in batch order.
    pub rejected: Vec<RejectedSubmission>,
    /// The `offline_queue_replayed` audit record.
    pub audit_event_id: EventId,
}

/// A queued submission the ledger refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedSubmission {
    /// Position in the submitted batch.
    pub index: usize,
    pub event_type: EventType,
    pub idempotency_key: Option<String>,
    pub reason: String,
}

#[derive(Clone)]
pub struct ReplayEngine {
    ledger: LedgerService,
    conflicts: ConflictCoordinator,
}

impl ReplayEngine {
    pub fn new(ledger: LedgerService, conflicts: ConflictCoordinator) -> Self {
        Self { ledger, conflicts }
    }

    /// Replay `batch` for `client_id`, recording the audit event in `trace_id`.
    #[instrument(skip(self, batch), fields(batch_len = batch.len()))]
    pub fn replay(
        &self,
        client_id: &str,
        trace_id: &str,
        batch: Vec<EventSubmission>,
    ) -> CausewayResult<ReplayReport> {
        let submitted = batch.len();
        let mut created = 0usize;
        let mut existing = 0usize;
        let mut ids = Vec::with_capacity(submitted);
        let mut targets = BTreeSet::new();
        let mut rejected = Vec::new();

        for (index, submission) in batch.into_iter().enumerate() {
            let event_type = submission.event_type;
            let idempotency_key = submission.idempotency_key.clone();
            let outcome = match self.ledger.log(submission) {
                Ok(outcome) => outcome,
                Err(e) if is_rejection(&e) => {
                    warn!(index, %event_type, error = %e, "queued submission rejected");
                    rejected.push(RejectedSubmission {
                        index,
                        event_type,
                        idempotency_key,
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };
            if outcome.is_created() {
                created += 1;
            } else {
                existing += 1;
            }
            let record = outcome.into_record();
            if let Some(target) = record.target_id.clone() {
                targets.insert(target);
            }
            ids.push(record.id);
        }

        let mut conflicts = Vec::new();
        for target in &targets {
            conflicts.extend(self.conflicts.resolve_target(target, None)?);
        }

        // Re-read so supersession and review flags from resolution show up.
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.ledger.get(id)? {
                records.push(record);
            }
        }
        let ordered = TemporalReorderer::reorder(records);

        let audit = self.ledger.log(EventSubmission::server(
            trace_id,
            EventPayload::OfflineQueueReplayed(OfflineQueueReplayed {
                client_id: client_id.to_string(),
                submitted: count(submitted),
                created: count(created),
                existing: count(existing),
                conflicts: count(conflicts.len()),
                rejected: count(rejected.len()),
            }),
        ))?;

        info!(
            client_id,
            submitted,
            created,
            existing,
            conflicts = conflicts.len(),
            rejected = rejected.len(),
            "offline queue replayed"
        );

        Ok(ReplayReport {
            client_id: client_id.to_string(),
            ordered,
            created,
            existing,
            conflicts,
            rejected,
            audit_event_id: audit.record().id,
        })
    }
}

/// Errors that condemn one submission rather than the store. Anything else
/// aborts the replay.
fn is_rejection(e: &CausewayError) -> bool {
    matches!(
        e,
        CausewayError::ValidationError(_)
            | CausewayError::LedgerError(
                LedgerError::PayloadMismatch { .. }
                    | LedgerError::InvalidPayload { .. }
                    | LedgerError::UnsupportedSchema { .. }
                    | LedgerError::ClosureChainViolation { .. }
            )
    )
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
