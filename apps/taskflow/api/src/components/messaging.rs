use async_trait::async_trait;
use domain_tasks::{BrokerTaskEventPublisher, NoopTaskEventPublisher, TaskEventPublisher};
use lifecycle::{BoxError, Component};
use messaging::{MessagingConfig, NatsPublisher};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Owns the NATS connection when publishing is enabled.
pub struct MessagingComponent {
    config: MessagingConfig,
    publisher: RwLock<Option<Arc<NatsPublisher>>>,
}

impl MessagingComponent {
    pub fn new(config: MessagingConfig) -> Self {
        Self {
            config,
            publisher: RwLock::new(None),
        }
    }

    /// Publisher for task events: the broker when connected, otherwise one
    /// that drops events.
    pub async fn task_publisher(&self) -> Arc<dyn TaskEventPublisher> {
        match self.publisher.read().await.clone() {
            Some(nats) => Arc::new(BrokerTaskEventPublisher::new(nats, self.config.clone())),
            None => Arc::new(NoopTaskEventPublisher),
        }
    }
}

#[async_trait]
impl Component for MessagingComponent {
    fn name(&self) -> &'static str {
        "messaging"
    }

    async fn start(&self) -> Result<(), BoxError> {
        if !self.config.enabled {
            info!("Event publishing disabled (NATS_ENABLED=false)");
            return Ok(());
        }

        let nats = NatsPublisher::connect(&self.config).await?;
        *self.publisher.write().await = Some(Arc::new(nats));
        Ok(())
    }

    async fn stop(&self) -> Result<(), BoxError> {
        if let Some(nats) = self.publisher.write().await.take() {
            nats.flush().await?;
            info!("NATS publisher flushed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_tasks::TaskDeletedEvent;

    #[tokio::test]
    async fn test_disabled_broker_uses_noop_publisher() {
        let component = MessagingComponent::new(MessagingConfig::default());

        component.start().await.unwrap();
        assert!(component.publisher.read().await.is_none());

        let publisher = component.task_publisher().await;
        publisher
            .publish_task_deleted(&TaskDeletedEvent::now(1))
            .await
            .unwrap();

        component.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_broker_fails_start() {
        let component = MessagingComponent::new(MessagingConfig {
            enabled: true,
            url: "nats://127.0.0.1:1".to_string(),
            ..MessagingConfig::default()
        });

        let err = component.start().await.unwrap_err();
        assert!(err.to_string().contains("nats://127.0.0.1:1"));
    }
}
