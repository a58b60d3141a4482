//! Error taxonomy for the ledger.
//!
//! Every subsystem has its own `thiserror` enum; all of them fold into
//! [`CausewayError`] through `#[from]` so callers can use `?` throughout.

mod causal_error;
mod compaction_error;
mod ledger_error;
mod storage_error;

pub use causal_error::CausalError;
pub use compaction_error::CompactionError;
pub use ledger_error::LedgerError;
pub use storage_error::StorageError;

/// Top-level error type for all Causeway operations.
#[derive(Debug, thiserror::Error)]
pub enum CausewayError {
    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("ledger error: {0}")]
    LedgerError(#[from] LedgerError),

    #[error("causal error: {0}")]
    CausalError(#[from] CausalError),

    #[error("compaction error: {0}")]
    CompactionError(#[from] CompactionError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

impl CausewayError {
    /// Whether the operation that produced this error may be retried as-is.
    ///
    /// Only sequence contention and a busy/locked store qualify. Integrity and
    /// validation failures never become retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            CausewayError::LedgerError(LedgerError::SequenceConflict { .. }) => true,
            CausewayError::StorageError(StorageError::Busy { .. }) => true,
            _ => false,
        }
    }

    /// Whether this error belongs to the zero-tolerance class that must reach
    /// operational monitoring instead of being handled locally.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CausewayError::LedgerError(LedgerError::ClosureChainViolation { .. })
                | CausewayError::LedgerError(LedgerError::ChecksumMismatch { .. })
                | CausewayError::StorageError(StorageError::CorruptionDetected { .. })
        )
    }
}

impl From<toml::de::Error> for CausewayError {
    fn from(e: toml::de::Error) -> Self {
        CausewayError::ConfigError(e.to_string())
    }
}

/// Convenience alias used across the workspace.
pub type CausewayResult<T> = Result<T, CausewayError>;
