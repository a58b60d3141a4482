use crate::models::EventId;

/// Causal ordering errors.
#[derive(Debug, thiserror::Error)]
pub enum CausalError {
    /// Conflict resolution was asked about a record with no clock.
    #[error("event {event_id} has no vector clock")]
    ClockMissing { event_id: EventId },

    #[error("cycle detected in causal chain: {path}")]
    CycleDetected { path: String },
}
