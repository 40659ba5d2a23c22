use crate::session::SessionEvent;
use serde::{Deserialize, Serialize};

/// Session event published to NATS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEventMessage {
    pub channel: String,
    pub timestamp: String,  // RFC3339 timestamp
    #[serde(flatten)]
    pub event: SessionEvent,
}
