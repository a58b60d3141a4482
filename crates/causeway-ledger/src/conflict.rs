//! ConflictCoordinator: turns detected concurrent pairs into persisted
//! resolutions.
//!
//! For every pair the configured strategy picks a winner. The loser is
//! superseded, the winner becomes the target's last applied record, and
//! manual or merge outcomes flag both sides for review. Each resolution is
//! itself logged as a `conflict_resolved` event keyed on the pair and
//! strategy, so re-running over the same target never duplicates the audit
//! trail.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use causeway_causal::{detect_conflicts, ClockComparator, ClockOrdering, ConflictResolver};
use causeway_core::constants::MAX_CONFLICT_WINDOW;
use causeway_core::errors::{CausalError, CausewayError, CausewayResult, LedgerError};
use causeway_core::models::payload::ConflictResolved;
use causeway_core::models::{
    ConflictPair, ConflictStrategy, EventId, EventPayload, EventRecord, EventSubmission,
    Resolution,
};

use crate::service::LedgerService;

/// One persisted resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictOutcome {
    pub pair: ConflictPair,
    pub resolution: Resolution,
    /// The `conflict_resolved` audit record.
    pub audit_event_id: EventId,
}

#[derive(Clone)]
pub struct ConflictCoordinator {
    ledger: LedgerService,
    default_strategy: ConflictStrategy,
}

impl ConflictCoordinator {
    pub fn new(ledger: LedgerService, default_strategy: ConflictStrategy) -> Self {
        Self {
            ledger,
            default_strategy,
        }
    }

    pub fn default_strategy(&self) -> ConflictStrategy {
        self.default_strategy
    }

    /// Detect and resolve conflicts in the recent history of one target.
    #[instrument(skip(self))]
    pub fn resolve_target(
        &self,
        target_id: &str,
        strategy: Option<ConflictStrategy>,
    ) -> CausewayResult<Vec<ConflictOutcome>> {
        let history = self
            .ledger
            .storage()
            .events_for_target(target_id, MAX_CONFLICT_WINDOW)?;
        self.resolve_records(&history, strategy)
    }

    /// Detect and resolve conflicts among `records`.
    pub fn resolve_records(
        &self,
        records: &[EventRecord],
        strategy: Option<ConflictStrategy>,
    ) -> CausewayResult<Vec<ConflictOutcome>> {
        let strategy = strategy.unwrap_or(self.default_strategy);
        let by_id: HashMap<EventId, &EventRecord> = records.iter().map(|r| (r.id, r)).collect();
        let mut superseded: HashSet<EventId> = HashSet::new();
        let mut outcomes = Vec::new();

        for pair in detect_conflicts(records) {
            let (Some(a), Some(b)) = (by_id.get(&pair.left), by_id.get(&pair.right)) else {
                continue;
            };
            // A record that already lost to a third one in this pass is out.
            if superseded.contains(&a.id) || superseded.contains(&b.id) {
                continue;
            }
            // Both sides already await review from an earlier pass.
            if a.review_required && b.review_required {
                continue;
            }

            let outcome = self.apply(pair, a, b, strategy)?;
            if let Some(loser) = outcome.resolution.loser {
                superseded.insert(loser);
            }
            outcomes.push(outcome);
        }

        if !outcomes.is_empty() {
            info!(count = outcomes.len(), %strategy, "resolved conflicts");
        }
        Ok(outcomes)
    }

    /// Resolve one explicit pair, e.g. an operator settling a record that was
    /// flagged for review. Both records must carry clocks, share a target,
    /// and be concurrent.
    #[instrument(skip(self))]
    pub fn resolve_pair(
        &self,
        left: EventId,
        right: EventId,
        strategy: ConflictStrategy,
    ) -> CausewayResult<ConflictOutcome> {
        let a = self.load(left)?;
        let b = self.load(right)?;
        let (Some(ca), Some(cb)) = (a.vector_clock.as_ref(), b.vector_clock.as_ref()) else {
            let event_id = if a.vector_clock.is_none() { a.id } else { b.id };
            return Err(CausalError::ClockMissing { event_id }.into());
        };
        let target_id = match (a.target_id.as_deref(), b.target_id.as_deref()) {
            (Some(ta), Some(tb)) if ta == tb => ta.to_string(),
            _ => {
                return Err(CausewayError::ValidationError(format!(
                    "events {left} and {right} do not share a target"
                )))
            }
        };
        if ClockComparator::compare(ca, cb) != ClockOrdering::Concurrent {
            return Err(CausewayError::ValidationError(format!(
                "events {left} and {right} are causally ordered, nothing to resolve"
            )));
        }

        let (lo, hi) = if a.id <= b.id { (&a, &b) } else { (&b, &a) };
        let pair = ConflictPair {
            target_id,
            left: lo.id,
            right: hi.id,
        };
        self.apply(pair, lo, hi, strategy)
    }

    fn load(&self, id: EventId) -> CausewayResult<EventRecord> {
        self.ledger
            .get(id)?
            .ok_or_else(|| LedgerError::EventNotFound { event_id: id }.into())
    }

    fn apply(
        &self,
        pair: ConflictPair,
        a: &EventRecord,
        b: &EventRecord,
        strategy: ConflictStrategy,
    ) -> CausewayResult<ConflictOutcome> {
        let resolution = ConflictResolver::resolve(a, b, strategy);
        let storage = self.ledger.storage();

        if let (Some(winner), Some(loser)) = (resolution.winner, resolution.loser) {
            storage.mark_superseded(loser, winner)?;
            storage.set_last_applied(winner, winner)?;
        }
        if resolution.review_required {
            storage.flag_for_review(a.id, &ConflictResolver::review_message(a, b, strategy))?;
            storage.flag_for_review(b.id, &ConflictResolver::review_message(b, a, strategy))?;
        }

        warn!(
            target_id = %pair.target_id,
            left = pair.left,
            right = pair.right,
            winner = ?resolution.winner,
            review_required = resolution.review_required,
            %strategy,
            "concurrent edit resolved"
        );

        let audit = EventSubmission::server(
            a.trace_id.clone(),
            EventPayload::ConflictResolved(ConflictResolved {
                target_id: pair.target_id.clone(),
                strategy: strategy.as_str().to_string(),
                winner_id: resolution.winner,
                loser_id: resolution.loser,
                review_required: resolution.review_required,
            }),
        )
        .with_idempotency_key(format!("conflict:{}:{}:{}", pair.left, pair.right, strategy));
        let audit = self.ledger.log(audit)?;

        Ok(ConflictOutcome {
            pair,
            resolution,
            audit_event_id: audit.record().id,
        })
    }
}
