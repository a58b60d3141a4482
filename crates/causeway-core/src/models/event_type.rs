use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of event types recorded in the ledger.
///
/// Stored as snake_case strings. Adding a variant forces every exhaustive
/// match (payload registry, timeline rendering) to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SessionStarted,
    SessionEnded,
    RecordingChunkReceived,
    TranscriptGenerated,
    TaskExtracted,
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    TaskDeleted,
    MeetingCreated,
    MeetingUpdated,
    SummaryGenerated,
    OfflineQueueReplayed,
    ConflictResolved,
}

impl EventType {
    pub const ALL: [EventType; 14] = [
        EventType::SessionStarted,
        EventType::SessionEnded,
        EventType::RecordingChunkReceived,
        EventType::TranscriptGenerated,
        EventType::TaskExtracted,
        EventType::TaskCreated,
        EventType::TaskUpdated,
        EventType::TaskCompleted,
        EventType::TaskDeleted,
        EventType::MeetingCreated,
        EventType::MeetingUpdated,
        EventType::SummaryGenerated,
        EventType::OfflineQueueReplayed,
        EventType::ConflictResolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SessionStarted => "session_started",
            EventType::SessionEnded => "session_ended",
            EventType::RecordingChunkReceived => "recording_chunk_received",
            EventType::TranscriptGenerated => "transcript_generated",
            EventType::TaskExtracted => "task_extracted",
            EventType::TaskCreated => "task_created",
            EventType::TaskUpdated => "task_updated",
            EventType::TaskCompleted => "task_completed",
            EventType::TaskDeleted => "task_deleted",
            EventType::MeetingCreated => "meeting_created",
            EventType::MeetingUpdated => "meeting_updated",
            EventType::SummaryGenerated => "summary_generated",
            EventType::OfflineQueueReplayed => "offline_queue_replayed",
            EventType::ConflictResolved => "conflict_resolved",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown event type: {s}"))
    }
}
