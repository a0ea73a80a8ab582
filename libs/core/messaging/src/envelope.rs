use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PublishError;

/// Wire format of every published event.
///
/// ```json
/// {
///   "event_type": "task.completed",
///   "payload": { "task_id": 42, "completed_at": "2025-01-01T10:00:00Z" },
///   "timestamp": "2025-01-01T10:00:00.120Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    pub event_type: String,
    pub payload: T,
    /// When the envelope was built, not when the change happened
    pub timestamp: DateTime<Utc>,
}

impl<T> EventEnvelope<T> {
    pub fn new(event_type: impl Into<String>, payload: T) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> EventEnvelope<T> {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PublishError> {
        Ok(serde_json::to_vec(self)?)
    }
}
