use std::sync::Arc;

use tracing::trace;

use causeway_core::errors::CausewayResult;
use causeway_core::traits::ISequenceAssigner;

use crate::pool::WriteConnection;
use crate::queries::sequence_ops;

/// Assigner backed by the `ledger_sequence` row and an IMMEDIATE transaction.
pub struct StoreSequencer {
    writer: Arc<WriteConnection>,
}

impl StoreSequencer {
    pub fn new(writer: Arc<WriteConnection>) -> Self {
        Self { writer }
    }
}

impl ISequenceAssigner for StoreSequencer {
    fn next_sequence(&self) -> CausewayResult<i64> {
        let next = self.writer.with_conn(sequence_ops::next_sequence)?;
        trace!(sequence_num = next, "assigned sequence");
        Ok(next)
    }

    fn current(&self) -> CausewayResult<i64> {
        self.writer.with_conn(sequence_ops::current_sequence)
    }
}
