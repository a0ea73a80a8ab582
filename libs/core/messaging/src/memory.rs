use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::{EventPublisher, PublishError};

/// A message accepted by [`MemoryPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub subject: String,
    pub key: String,
    pub payload: Vec<u8>,
}

impl PublishedMessage {
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

/// Keeps published messages in memory. Can be told to reject publishes.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    messages: Mutex<Vec<PublishedMessage>>,
    failing: AtomicBool,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher whose every publish fails with a transport error.
    pub fn failing() -> Self {
        let publisher = Self::default();
        publisher.set_failing(true);
        publisher
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn messages(&self) -> Vec<PublishedMessage> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl EventPublisher for MemoryPublisher {
    async fn publish(&self, subject: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::Transport(format!(
                "memory publisher rejected {subject}"
            )));
        }

        self.messages.lock().await.push(PublishedMessage {
            subject: subject.to_string(),
            key: key.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_in_order() {
        let publisher = MemoryPublisher::new();
        publisher.publish("tasks.a", "task-1", b"{}").await.unwrap();
        publisher.publish("tasks.b", "task-2", b"[]").await.unwrap();

        let messages = publisher.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].subject, "tasks.a");
        assert_eq!(messages[1].key, "task-2");
    }

    #[tokio::test]
    async fn test_failing_rejects_and_records_nothing() {
        let publisher = MemoryPublisher::failing();
        let err = publisher.publish("tasks.a", "task-1", b"{}").await.unwrap_err();

        assert!(matches!(err, PublishError::Transport(_)));
        assert!(publisher.messages().await.is_empty());
    }
}
