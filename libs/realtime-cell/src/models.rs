use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    SessionStarted,
    SessionProgressUpdated,
    SessionCompleted,
}

/// A state-change notification for one session. Carries the full updated
/// session snapshot, not a diff, so subscribers never need replay. The
/// snapshot is kept opaque here: the broker has no dependency on the
/// session cell's types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub snapshot: Value,
}

impl SessionEvent {
    pub fn new(kind: SessionEventKind, session_id: Uuid, snapshot: Value) -> Self {
        Self {
            kind,
            session_id,
            timestamp: Utc::now(),
            snapshot,
        }
    }
}

/// Commands an observer sends over the WebSocket connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientCommand {
    Join { session_id: Uuid },
    Leave { session_id: Uuid },
}
