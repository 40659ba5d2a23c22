use super::messages::SessionEventMessage;
use crate::session::SessionEvent;
use anyhow::{Context, Result};
use async_nats::Client;
use tracing::{debug, info};

/// Publishes session events for downstream flow consumers
pub struct NatsClient {
    client: Client,
    subject_prefix: String,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, subject_prefix: impl Into<String>) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            subject_prefix: subject_prefix.into(),
        })
    }

    pub fn subject_for(&self, channel: &str) -> String {
        event_subject(&self.subject_prefix, channel)
    }

    /// Publish one session event to `<prefix>.<channel>`
    pub async fn publish_event(&self, channel: &str, event: &SessionEvent) -> Result<()> {
        let subject = self.subject_for(channel);

        let message = SessionEventMessage {
            channel: channel.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            event: event.clone(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish session event")?;

        debug!("Published session event to {}", subject);

        Ok(())
    }
}

/// NATS subject for a channel; subject tokens cannot contain '.', '*', '>' or whitespace
pub fn event_subject(prefix: &str, channel: &str) -> String {
    let token: String = channel
        .chars()
        .map(|c| match c {
            '.' | '*' | '>' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    format!("{}.{}", prefix, token)
}
