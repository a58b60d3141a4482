use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::EventId;

/// How a pair of vector-clock concurrent records is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// Lower id (server-authored) wins.
    ServerWins,
    /// Higher id (client-authored) wins.
    ClientWins,
    /// Later `created_at` wins.
    LastWriteWins,
    /// Behaves as `LastWriteWins` and flags both records for review.
    /// Field-level merge is not defined.
    Merge,
    /// No automatic winner.
    Manual,
}

impl ConflictStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictStrategy::ServerWins => "server_wins",
            ConflictStrategy::ClientWins => "client_wins",
            ConflictStrategy::LastWriteWins => "last_write_wins",
            ConflictStrategy::Merge => "merge",
            ConflictStrategy::Manual => "manual",
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server_wins" => Ok(ConflictStrategy::ServerWins),
            "client_wins" => Ok(ConflictStrategy::ClientWins),
            "last_write_wins" => Ok(ConflictStrategy::LastWriteWins),
            "merge" => Ok(ConflictStrategy::Merge),
            "manual" => Ok(ConflictStrategy::Manual),
            other => Err(format!("unknown conflict strategy: {other}")),
        }
    }
}

/// Two records on the same target whose clocks are concurrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPair {
    pub target_id: String,
    pub left: EventId,
    pub right: EventId,
}

/// Outcome of resolving one [`ConflictPair`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub strategy: ConflictStrategy,
    pub winner: Option<EventId>,
    pub loser: Option<EventId>,
    pub review_required: bool,
}

impl Resolution {
    pub fn is_manual(&self) -> bool {
        self.winner.is_none()
    }
}
