use core_config::{env_or_default, env_parse, ConfigError, FromEnv};

/// Broker settings.
///
/// Environment variables:
/// - `NATS_ENABLED` (default `false`)
/// - `NATS_URL` (default `nats://localhost:4222`)
/// - `NATS_SUBJECT_PREFIX` (default `tasks`)
/// - `NATS_CLIENT_NAME` (default `taskflow-api`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagingConfig {
    pub enabled: bool,
    pub url: String,
    pub subject_prefix: String,
    pub client_name: String,
}

impl MessagingConfig {
    /// Subject an event of `event_type` is published on.
    pub fn subject_for(&self, event_type: &str) -> String {
        format!("{}.{}", self.subject_prefix, event_type)
    }

    /// Wildcard matching every subject under the prefix.
    pub fn subscription_subject(&self) -> String {
        format!("{}.>", self.subject_prefix)
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "nats://localhost:4222".to_string(),
            subject_prefix: "tasks".to_string(),
            client_name: "taskflow-api".to_string(),
        }
    }
}

impl FromEnv for MessagingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: env_parse("NATS_ENABLED", "false")?,
            url: env_or_default("NATS_URL", "nats://localhost:4222"),
            subject_prefix: env_or_default("NATS_SUBJECT_PREFIX", "tasks"),
            client_name: env_or_default("NATS_CLIENT_NAME", "taskflow-api"),
        })
    }
}
