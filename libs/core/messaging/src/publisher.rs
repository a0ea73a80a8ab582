use async_trait::async_trait;

use crate::PublishError;

/// Transport for serialized events.
///
/// Implementations must be safe to share across request tasks.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes `payload` on `subject`. `key` identifies the entity the
    /// event is about so consumers can keep per-entity order.
    async fn publish(&self, subject: &str, key: &str, payload: &[u8]) -> Result<(), PublishError>;
}
