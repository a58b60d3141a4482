//! LedgerService: the write and read façade over the event ledger.
//!
//! Writes go through [`LedgerService::log`], which validates the payload,
//! enforces the session closure chain, assigns a sequence number and
//! checksum, and persists a `pending` record. Lifecycle methods move a
//! record through the state machine one guarded update at a time.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use causeway_core::checksum;
use causeway_core::constants::MAX_CAUSAL_CHAIN_DEPTH;
use causeway_core::errors::{CausalError, CausewayError, CausewayResult, LedgerError};
use causeway_core::models::{
    EventId, EventRecord, EventStatus, EventSubmission, EventType, InsertOutcome, NewEvent,
    PayloadRegistry, StatusTransition, TimelineEntry, TraceStats,
};
use causeway_core::traits::{ILedgerStorage, ISequenceAssigner};

/// Result of [`LedgerService::log`].
#[derive(Debug, Clone)]
pub enum LogOutcome {
    /// A new `pending` record was written.
    Created(EventRecord),
    /// The idempotency key was already taken; this is the stored record,
    /// unchanged.
    Existing(EventRecord),
}

impl LogOutcome {
    pub fn record(&self) -> &EventRecord {
        match self {
            LogOutcome::Created(r) | LogOutcome::Existing(r) => r,
        }
    }

    pub fn into_record(self) -> EventRecord {
        match self {
            LogOutcome::Created(r) | LogOutcome::Existing(r) => r,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, LogOutcome::Created(_))
    }
}

/// Façade over ledger storage and the sequence assigner.
#[derive(Clone)]
pub struct LedgerService {
    storage: Arc<dyn ILedgerStorage>,
    sequencer: Arc<dyn ISequenceAssigner>,
    /// Retries on a retryable insert or sequence error before giving up.
    max_retries: u32,
}

impl LedgerService {
    pub fn new(
        storage: Arc<dyn ILedgerStorage>,
        sequencer: Arc<dyn ISequenceAssigner>,
        max_retries: u32,
    ) -> Self {
        Self {
            storage,
            sequencer,
            max_retries,
        }
    }

    /// The underlying storage handle.
    pub fn storage(&self) -> &Arc<dyn ILedgerStorage> {
        &self.storage
    }

    /// Record a submission.
    ///
    /// A reused idempotency key returns the stored record untouched. A
    /// `SessionEnded` with no `SessionStarted` in the same trace is rejected
    /// with `ClosureChainViolation`.
    #[instrument(skip(self, submission), fields(trace_id = %submission.trace_id, event_type = %submission.event_type))]
    pub fn log(&self, submission: EventSubmission) -> CausewayResult<LogOutcome> {
        if let Some(key) = submission.idempotency_key.as_deref() {
            if let Some(existing) = self.storage.find_by_idempotency_key(key)? {
                debug!(event_id = existing.id, key, "idempotency key reused, returning existing record");
                return Ok(LogOutcome::Existing(existing));
            }
        }

        PayloadRegistry::validate(submission.event_type, &submission.payload)?;
        self.enforce_closure_chain(&submission)?;

        let event_type = submission.event_type;
        let new_event = NewEvent {
            checksum: checksum::checksum(&submission.payload)?,
            schema_version: PayloadRegistry::schema_version(event_type),
            target_id: submission.payload.target_id().map(str::to_string),
            trace_id: submission.trace_id,
            session_id: submission.session_id,
            idempotency_key: submission.idempotency_key,
            sequence_num: 0,
            vector_clock: submission.vector_clock,
            client_id: submission.client_id,
            event_type,
            payload: submission.payload,
            parent_event_id: submission.parent_event_id,
            created_at: Utc::now(),
        };

        self.insert_with_retry(new_event)
    }

    fn insert_with_retry(&self, mut event: NewEvent) -> CausewayResult<LogOutcome> {
        let mut attempt = 0u32;
        loop {
            let result = self.sequencer.next_sequence().and_then(|seq| {
                event.sequence_num = seq;
                self.storage.insert_event(&event)
            });

            match result {
                Ok(InsertOutcome::Inserted(record)) => {
                    info!(
                        event_id = record.id,
                        sequence_num = record.sequence_num,
                        "event logged"
                    );
                    return Ok(LogOutcome::Created(record));
                }
                Ok(InsertOutcome::KeyExists(existing)) => {
                    debug!(event_id = existing.id, "lost idempotency race, returning existing record");
                    return Ok(LogOutcome::Existing(existing));
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, max_retries = self.max_retries, error = %e, "retrying event insert");
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn enforce_closure_chain(&self, submission: &EventSubmission) -> CausewayResult<()> {
        if submission.event_type != EventType::SessionEnded {
            return Ok(());
        }
        let required = EventType::SessionStarted;
        if self
            .storage
            .trace_has_event_type(&submission.trace_id, required)?
        {
            return Ok(());
        }
        error!(
            trace_id = %submission.trace_id,
            "session_ended logged without session_started"
        );
        Err(LedgerError::ClosureChainViolation {
            trace_id: submission.trace_id.clone(),
            event_type: submission.event_type,
            required,
        }
        .into())
    }

    // --- Lifecycle ---

    /// `pending` → `processing`. Refused for a record that lost a conflict.
    pub fn start(&self, record: &EventRecord) -> CausewayResult<EventRecord> {
        self.transition(record, EventStatus::Processing, None)
    }

    /// `processing` → `completed`. The record becomes the latest applied
    /// state of its target. Refused for a record that lost a conflict.
    pub fn complete(&self, record: &EventRecord) -> CausewayResult<EventRecord> {
        self.transition(record, EventStatus::Completed, None)
    }

    /// `processing` → `failed`.
    pub fn fail(&self, record: &EventRecord, error_message: &str) -> CausewayResult<EventRecord> {
        self.transition(record, EventStatus::Failed, Some(error_message))
    }

    /// `pending` → `skipped`. The way out for a superseded record.
    pub fn skip(&self, record: &EventRecord, reason: &str) -> CausewayResult<EventRecord> {
        self.transition(record, EventStatus::Skipped, Some(reason))
    }

    fn transition(
        &self,
        record: &EventRecord,
        to: EventStatus,
        message: Option<&str>,
    ) -> CausewayResult<EventRecord> {
        let from = record.status;
        if !from.can_transition_to(to) {
            return Err(LedgerError::InvalidTransition {
                event_id: record.id,
                from,
                to,
            }
            .into());
        }

        let at = Utc::now();
        let step = StatusTransition {
            event_id: record.id,
            from,
            to,
            at,
            duration_ms: record
                .started_at
                .map(|start| (at - start).num_milliseconds().max(0)),
            message: message.map(str::to_string),
        };
        if step.applies() {
            if let Some(winner) = record.superseded_by {
                return Err(superseded(record.id, winner));
            }
        }

        let Some(stored) = self.storage.transition_event(&step)? else {
            // The caller's copy is stale: another writer moved or superseded it.
            let current = self
                .storage
                .get_event(record.id)?
                .ok_or(LedgerError::EventNotFound {
                    event_id: record.id,
                })?;
            if step.applies() {
                if let Some(winner) = current.superseded_by {
                    return Err(superseded(record.id, winner));
                }
            }
            return Err(LedgerError::InvalidTransition {
                event_id: record.id,
                from: current.status,
                to,
            }
            .into());
        };

        debug!(event_id = stored.id, %from, %to, duration_ms = ?stored.duration_ms, "transitioned");
        Ok(stored)
    }

    // --- Queries ---

    pub fn get(&self, id: EventId) -> CausewayResult<Option<EventRecord>> {
        self.storage.get_event(id)
    }

    /// Records of a trace, ordered by creation.
    pub fn events_for_trace(&self, trace_id: &str) -> CausewayResult<Vec<EventRecord>> {
        self.storage.events_for_trace(trace_id)
    }

    /// Records of a session, ordered by creation.
    pub fn events_for_session(&self, session_id: &str) -> CausewayResult<Vec<EventRecord>> {
        self.storage.events_for_session(session_id)
    }

    /// Most recent record of `event_type` for `target_id`.
    pub fn latest_for_target(
        &self,
        event_type: EventType,
        target_id: &str,
    ) -> CausewayResult<Option<EventRecord>> {
        self.storage.latest_event_for_target(event_type, target_id)
    }

    /// Chronological, human-readable view of a trace.
    pub fn timeline(&self, trace_id: &str) -> CausewayResult<Vec<TimelineEntry>> {
        Ok(self
            .storage
            .events_for_trace(trace_id)?
            .into_iter()
            .map(|r| TimelineEntry {
                event_id: r.id,
                sequence_num: r.sequence_num,
                event_type: r.event_type,
                status: r.status,
                description: r.payload.describe(),
                created_at: r.created_at,
                completed_at: r.completed_at,
                duration_ms: r.duration_ms,
                error_message: r.error_message,
                review_required: r.review_required,
            })
            .collect())
    }

    pub fn stats(&self, trace_id: &str) -> CausewayResult<TraceStats> {
        self.storage.trace_stats(trace_id)
    }

    // --- Integrity ---

    /// Load a record and fail with `ChecksumMismatch` if its payload no
    /// longer matches the stored checksum.
    pub fn get_verified(&self, id: EventId) -> CausewayResult<EventRecord> {
        let record = self
            .storage
            .get_event(id)?
            .ok_or(LedgerError::EventNotFound { event_id: id })?;
        let raw_ok = self.storage.verify_stored_checksum(id)?.unwrap_or(false);
        if !raw_ok {
            let computed = checksum::checksum(&record.payload)?;
            error!(event_id = id, stored = %record.checksum, %computed, "checksum mismatch");
            return Err(LedgerError::ChecksumMismatch {
                event_id: id,
                stored: record.checksum,
                computed,
            }
            .into());
        }
        Ok(record)
    }

    /// Recompute every checksum in a trace. Returns the ids that fail.
    #[instrument(skip(self))]
    pub fn verify_trace(&self, trace_id: &str) -> CausewayResult<Vec<EventId>> {
        let mut corrupted = Vec::new();
        for record in self.storage.events_for_trace(trace_id)? {
            if self.storage.verify_stored_checksum(record.id)? != Some(true) {
                error!(event_id = record.id, trace_id, "checksum mismatch");
                corrupted.push(record.id);
            }
        }
        Ok(corrupted)
    }

    /// Ancestors of `id` through `parent_event_id`, root first, ending with
    /// the record itself. Stops early at a parent that no longer exists
    /// (compacted away).
    pub fn causal_chain(&self, id: EventId) -> CausewayResult<Vec<EventRecord>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(id);

        while let Some(current) = next {
            if !visited.insert(current) {
                let mut path: Vec<String> = chain.iter().map(|r: &EventRecord| r.id.to_string()).collect();
                path.push(current.to_string());
                return Err(CausalError::CycleDetected {
                    path: path.join(" -> "),
                }
                .into());
            }
            if chain.len() >= MAX_CAUSAL_CHAIN_DEPTH {
                warn!(event_id = id, depth = chain.len(), "causal chain truncated at depth limit");
                break;
            }
            let Some(record) = self.storage.get_event(current)? else {
                break;
            };
            next = record.parent_event_id;
            chain.push(record);
        }

        chain.reverse();
        Ok(chain)
    }
}

fn superseded(event_id: EventId, superseded_by: EventId) -> CausewayError {
    warn!(event_id, superseded_by, "refusing to apply superseded event");
    LedgerError::Superseded {
        event_id,
        superseded_by,
    }
    .into()
}
