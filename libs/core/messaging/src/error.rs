use thiserror::Error;

/// Why an event did not reach the broker.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("broker rejected publish: {0}")]
    Transport(String),

    /// Publishing is switched off in configuration
    #[error("event publishing is disabled")]
    Disabled,
}

/// Why a received event was not handled.
#[derive(Debug, Error)]
pub enum ConsumeError {
    /// The bytes are not an event envelope
    #[error("failed to decode event envelope: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("payload of {event_type} does not match its schema: {source}")]
    Payload {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown event type {0}")]
    UnknownEventType(String),

    #[error("subscription failed: {0}")]
    Transport(String),
}
