//! Event publishing and consumption for domain services.
//!
//! Domain code builds an [`EventEnvelope`] and hands the serialized bytes to
//! an [`EventPublisher`] together with a subject and a routing key. The
//! backend is chosen at startup:
//!
//! ```text
//! ┌──────────────┐   publish(subject, key, bytes)   ┌──────────────────┐
//! │ domain event │ ────────────────────────────────▶ │ NatsPublisher    │ (feature "nats")
//! │  publisher   │                                   │ MemoryPublisher  │ (tests, local runs)
//! └──────────────┘                                   └──────────────────┘
//! ```
//!
//! On the receiving side an [`EventHandler`] gets each [`ReceivedEvent`];
//! [`NatsSubscriber`] feeds it from `<prefix>.>` (feature "nats").
//!
//! # Example
//!
//! ```ignore
//! use messaging::{EventEnvelope, EventPublisher};
//!
//! let envelope = EventEnvelope::new("task.created", payload);
//! publisher
//!     .publish("tasks.task.created", "task-42", &envelope.to_bytes()?)
//!     .await?;
//! ```

mod config;
mod consumer;
mod envelope;
mod error;
mod memory;
#[cfg(feature = "nats")]
mod nats;
mod publisher;

pub use config::MessagingConfig;
pub use consumer::{handle_message, EventHandler, EventHeaders, ReceivedEvent};
pub use envelope::EventEnvelope;
pub use error::{ConsumeError, PublishError};
pub use memory::{MemoryPublisher, PublishedMessage};
#[cfg(feature = "nats")]
pub use nats::{NatsPublisher, NatsSubscriber};
pub use publisher::EventPublisher;
