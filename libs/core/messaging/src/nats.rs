//! NATS backend.

use async_nats::{Client, ConnectOptions, HeaderMap, Message};
use async_trait::async_trait;
use futures::StreamExt;
use observability::RequestContext;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::{
    handle_message, ConsumeError, EventHandler, EventHeaders, EventPublisher, MessagingConfig,
    PublishError,
};

async fn connect_client(config: &MessagingConfig, name: &str) -> Result<Client, String> {
    let client = ConnectOptions::new()
        .name(name)
        .connect(config.url.as_str())
        .await
        .map_err(|e| format!("failed to connect to NATS at {}: {e}", config.url))?;

    info!(url = %config.url, client = name, "Connected to NATS");
    Ok(client)
}

/// Publishes on core NATS subjects.
///
/// Each message carries headers `message-key` (the routing key) and, when the
/// publish happens while serving a request, `trace_id` and `request_id`.
#[derive(Clone, Debug)]
pub struct NatsPublisher {
    client: Client,
}

impl NatsPublisher {
    pub async fn connect(config: &MessagingConfig) -> Result<Self, PublishError> {
        let client = connect_client(config, &config.client_name)
            .await
            .map_err(PublishError::Transport)?;

        Ok(Self { client })
    }

    /// Waits until every buffered message has been written to the server.
    pub async fn flush(&self) -> Result<(), PublishError> {
        self.client
            .flush()
            .await
            .map_err(|e| PublishError::Transport(format!("flush failed: {e}")))
    }
}

fn headers_for(key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("message-key", key);

    if let Some(context) = RequestContext::current() {
        if let Some(trace_id) = context.trace_id.as_deref() {
            headers.insert("trace_id", trace_id);
        }
        if let Some(request_id) = context.request_id.as_deref() {
            headers.insert("request_id", request_id);
        }
    }

    headers
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    async fn publish(&self, subject: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
        self.client
            .publish_with_headers(subject.to_string(), headers_for(key), payload.to_vec().into())
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        debug!(subject, key, "Published event");
        Ok(())
    }
}

/// Consumes every event under the configured subject prefix.
///
/// Uses its own connection, named `<client_name>-subscriber`.
#[derive(Clone, Debug)]
pub struct NatsSubscriber {
    client: Client,
    subject: String,
}

impl NatsSubscriber {
    pub async fn connect(config: &MessagingConfig) -> Result<Self, ConsumeError> {
        let name = format!("{}-subscriber", config.client_name);
        let client = connect_client(config, &name)
            .await
            .map_err(ConsumeError::Transport)?;

        Ok(Self {
            client,
            subject: config.subscription_subject(),
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Hands each message to `handler` until `shutdown` flips (or its sender
    /// goes away), then drains: messages the server already sent are still
    /// handled before this returns.
    pub async fn run<H>(
        &self,
        handler: &H,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ConsumeError>
    where
        H: EventHandler + ?Sized,
    {
        let mut subscription = self
            .client
            .subscribe(self.subject.clone())
            .await
            .map_err(|e| ConsumeError::Transport(format!("subscribe to {}: {e}", self.subject)))?;
        info!(subject = %self.subject, "Subscribed to events");

        let mut draining = *shutdown.borrow();
        if draining {
            drain(&mut subscription, &self.subject).await?;
        }

        loop {
            tokio::select! {
                message = subscription.next() => match message {
                    Some(message) => {
                        let _ = handle_message(
                            handler,
                            message.subject.as_str(),
                            headers_of(&message),
                            &message.payload,
                        )
                        .await;
                    }
                    None => break,
                },
                _ = shutdown.changed(), if !draining => {
                    draining = true;
                    drain(&mut subscription, &self.subject).await?;
                }
            }
        }

        info!(subject = %self.subject, "Event subscription drained");
        Ok(())
    }
}

async fn drain(subscription: &mut async_nats::Subscriber, subject: &str) -> Result<(), ConsumeError> {
    debug!(subject, "Draining event subscription");
    subscription
        .drain()
        .await
        .map_err(|e| ConsumeError::Transport(format!("drain {subject}: {e}")))
}

fn headers_of(message: &Message) -> EventHeaders {
    let header = |name: &str| {
        message
            .headers
            .as_ref()
            .and_then(|headers| headers.get(name))
            .map(|value| value.as_str().to_string())
    };

    EventHeaders {
        key: header("message-key"),
        trace_id: header("trace_id"),
        request_id: header("request_id"),
    }
}
