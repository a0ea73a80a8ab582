use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{error, info_span, warn, Instrument};

use crate::{ConsumeError, EventEnvelope};

/// Metadata a publisher attaches next to the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventHeaders {
    /// `message-key`, the entity the event is about
    pub key: Option<String>,
    pub trace_id: Option<String>,
    pub request_id: Option<String>,
}

/// An event taken off the broker, envelope decoded, payload left as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedEvent {
    pub subject: String,
    pub headers: EventHeaders,
    pub envelope: EventEnvelope<serde_json::Value>,
}

impl ReceivedEvent {
    pub fn decode(
        subject: impl Into<String>,
        headers: EventHeaders,
        payload: &[u8],
    ) -> Result<Self, ConsumeError> {
        let envelope = serde_json::from_slice(payload).map_err(ConsumeError::Decode)?;

        Ok(Self {
            subject: subject.into(),
            headers,
            envelope,
        })
    }

    pub fn event_type(&self) -> &str {
        &self.envelope.event_type
    }

    /// Deserializes the payload into the type the event type promises.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, ConsumeError> {
        serde_json::from_value(self.envelope.payload.clone()).map_err(|source| {
            ConsumeError::Payload {
                event_type: self.envelope.event_type.clone(),
                source,
            }
        })
    }
}

/// Reacts to events from a subscription.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Returns [`ConsumeError::UnknownEventType`] for events it does not know.
    async fn handle(&self, event: &ReceivedEvent) -> Result<(), ConsumeError>;
}

/// Decodes one raw message and runs `handler` on it inside a span carrying
/// the publisher's `trace_id`.
///
/// Failures are logged here (unknown event types as warnings, everything
/// else as errors) and returned so callers can count them; a subscription
/// keeps going either way.
pub async fn handle_message<H>(
    handler: &H,
    subject: &str,
    headers: EventHeaders,
    payload: &[u8],
) -> Result<(), ConsumeError>
where
    H: EventHandler + ?Sized,
{
    let event = match ReceivedEvent::decode(subject, headers, payload) {
        Ok(event) => event,
        Err(e) => {
            error!(subject, error = %e, "Failed to decode event");
            return Err(e);
        }
    };

    let span = info_span!(
        "event",
        subject,
        event_type = %event.envelope.event_type,
        trace_id = event.headers.trace_id.as_deref().unwrap_or_default(),
    );

    let result = handler.handle(&event).instrument(span).await;
    match &result {
        Ok(()) => {}
        Err(ConsumeError::UnknownEventType(event_type)) => {
            warn!(subject, event_type = %event_type, "Unknown event type");
        }
        Err(e) => error!(subject, error = %e, "Failed to handle event"),
    }
    result
}
