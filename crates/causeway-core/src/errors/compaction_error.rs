/// Compaction errors.
#[derive(Debug, thiserror::Error)]
pub enum CompactionError {
    /// The atomic summary-write + delete unit failed and was rolled back.
    #[error("compaction failed (run {run_id}): {reason}")]
    CompactionFailure { run_id: String, reason: String },
}
