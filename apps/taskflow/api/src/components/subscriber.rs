use async_trait::async_trait;
use lifecycle::{BoxError, Component};
use messaging::{ConsumeError, EventHandler, MessagingConfig, NatsSubscriber};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::info;

/// Consumes `<prefix>.>` on a background task while messaging is enabled.
///
/// `stop` drains the subscription, so events already delivered by the server
/// are still handled, then waits for the task to finish.
pub struct SubscriberComponent {
    config: MessagingConfig,
    handler: Arc<dyn EventHandler>,
    task: Mutex<Option<JoinHandle<Result<(), ConsumeError>>>>,
    shutdown: watch::Sender<bool>,
}

impl SubscriberComponent {
    pub fn new(config: MessagingConfig, handler: Arc<dyn EventHandler>) -> Self {
        Self {
            config,
            handler,
            task: Mutex::new(None),
            shutdown: watch::Sender::new(false),
        }
    }
}

#[async_trait]
impl Component for SubscriberComponent {
    fn name(&self) -> &'static str {
        "subscriber"
    }

    async fn start(&self) -> Result<(), BoxError> {
        if !self.config.enabled {
            info!("Event subscriber disabled (NATS_ENABLED=false)");
            return Ok(());
        }

        let subscriber = NatsSubscriber::connect(&self.config).await?;
        let handler = Arc::clone(&self.handler);
        let shutdown = self.shutdown.subscribe();

        let handle =
            tokio::spawn(async move { subscriber.run(handler.as_ref(), shutdown).await });
        *self.task.lock().await = Some(handle);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BoxError> {
        let Some(handle) = self.task.lock().await.take() else {
            return Ok(());
        };

        self.shutdown.send_replace(true);
        handle.await??;
        info!("Event subscriber stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_tasks::TaskEventLogger;

    #[tokio::test]
    async fn test_disabled_broker_starts_nothing() {
        let component =
            SubscriberComponent::new(MessagingConfig::default(), Arc::new(TaskEventLogger));

        component.start().await.unwrap();
        assert!(component.task.lock().await.is_none());
        component.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_broker_fails_start() {
        let config = MessagingConfig {
            enabled: true,
            url: "nats://127.0.0.1:1".to_string(),
            ..MessagingConfig::default()
        };
        let component = SubscriberComponent::new(config, Arc::new(TaskEventLogger));

        let err = component.start().await.unwrap_err();
        assert!(err.to_string().contains("nats://127.0.0.1:1"));
        assert!(component.task.lock().await.is_none());
    }
}
