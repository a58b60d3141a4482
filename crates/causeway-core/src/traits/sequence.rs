use crate::errors::CausewayResult;

/// Exclusive counter handing out ledger sequence numbers.
///
/// Implementations must never return the same number twice. When exclusive
/// access cannot be obtained they return a retryable `SequenceConflict`
/// rather than a number that might collide.
pub trait ISequenceAssigner: Send + Sync {
    fn next_sequence(&self) -> CausewayResult<i64>;

    /// Highest number handed out so far (0 if none).
    fn current(&self) -> CausewayResult<i64>;
}
