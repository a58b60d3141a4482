use crate::errors::CausewayResult;
use crate::models::{
    BroadcastStatus, EventId, EventRecord, EventType, InsertOutcome, NewEvent, StatusTransition,
    TraceStats,
};

/// Persistence for the `event_ledger` collection.
pub trait ILedgerStorage: Send + Sync {
    // --- Writes ---
    fn insert_event(&self, event: &NewEvent) -> CausewayResult<InsertOutcome>;
    /// Apply one lifecycle step if the stored status is still
    /// `transition.from` (and, for steps that apply the record, it has not
    /// been superseded). Returns the stored record afterwards, or `None` when
    /// the guard did not match.
    fn transition_event(&self, transition: &StatusTransition)
        -> CausewayResult<Option<EventRecord>>;
    fn set_last_applied(&self, id: EventId, last_applied_id: EventId) -> CausewayResult<()>;
    fn mark_superseded(&self, loser: EventId, winner: EventId) -> CausewayResult<()>;
    fn flag_for_review(&self, id: EventId, message: &str) -> CausewayResult<()>;

    // --- Lookups ---
    fn get_event(&self, id: EventId) -> CausewayResult<Option<EventRecord>>;
    fn find_by_idempotency_key(&self, key: &str) -> CausewayResult<Option<EventRecord>>;
    fn events_for_trace(&self, trace_id: &str) -> CausewayResult<Vec<EventRecord>>;
    fn events_for_session(&self, session_id: &str) -> CausewayResult<Vec<EventRecord>>;
    fn events_for_target(&self, target_id: &str, limit: usize) -> CausewayResult<Vec<EventRecord>>;
    fn latest_event_for_target(
        &self,
        event_type: EventType,
        target_id: &str,
    ) -> CausewayResult<Option<EventRecord>>;
    fn trace_has_event_type(&self, trace_id: &str, event_type: EventType) -> CausewayResult<bool>;

    // --- Integrity ---
    /// Recompute the checksum over the raw stored payload. `None` if absent.
    fn verify_stored_checksum(&self, id: EventId) -> CausewayResult<Option<bool>>;

    // --- Broadcast ---
    fn pending_broadcasts(&self, limit: usize) -> CausewayResult<Vec<EventRecord>>;
    fn mark_broadcast(&self, ids: &[EventId], status: BroadcastStatus) -> CausewayResult<usize>;

    // --- Aggregation ---
    fn trace_stats(&self, trace_id: &str) -> CausewayResult<TraceStats>;
    fn event_count(&self) -> CausewayResult<usize>;
    fn max_sequence(&self) -> CausewayResult<i64>;
}
