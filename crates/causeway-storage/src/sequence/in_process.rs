use std::sync::Mutex;

use causeway_core::errors::{CausewayResult, LedgerError};
use causeway_core::traits::ISequenceAssigner;

/// Mutex-guarded counter. Correct only while this process is the sole writer.
pub struct InProcessSequencer {
    counter: Mutex<i64>,
}

impl InProcessSequencer {
    /// Start after `high_water`; the first number handed out is `high_water + 1`.
    pub fn starting_after(high_water: i64) -> Self {
        Self {
            counter: Mutex::new(high_water),
        }
    }
}

impl ISequenceAssigner for InProcessSequencer {
    fn next_sequence(&self) -> CausewayResult<i64> {
        // A poisoned lock means a holder panicked mid-update; refuse rather
        // than risk reissuing a number.
        let mut counter = self.counter.lock().map_err(|e| LedgerError::SequenceConflict {
            reason: format!("sequence lock poisoned: {e}"),
        })?;
        *counter += 1;
        Ok(*counter)
    }

    fn current(&self) -> CausewayResult<i64> {
        let counter = self.counter.lock().map_err(|e| LedgerError::SequenceConflict {
            reason: format!("sequence lock poisoned: {e}"),
        })?;
        Ok(*counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_after_high_water() {
        let seq = InProcessSequencer::starting_after(41);
        assert_eq!(seq.current().unwrap(), 41);
        assert_eq!(seq.next_sequence().unwrap(), 42);
        assert_eq!(seq.next_sequence().unwrap(), 43);
        assert_eq!(seq.current().unwrap(), 43);
    }

    #[test]
    fn concurrent_callers_get_contiguous_unique_numbers() {
        let seq = std::sync::Arc::new(InProcessSequencer::starting_after(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let seq = seq.clone();
                std::thread::spawn(move || {
                    (0..250).map(|_| seq.next_sequence().unwrap()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (1..=2000).collect::<Vec<_>>());
    }
}
