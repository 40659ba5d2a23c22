use super::event::SessionEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Connection state of a streaming session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and no attempt in flight
    Disconnected,
    /// Token acquisition or transport handshake in progress
    Connecting,
    /// Transport open and start descriptor sent, awaiting "listening"
    Open,
    /// Recognizer accepts audio
    Listening,
    /// Shutdown requested, waiting for the transport to close
    Closing,
}

/// Statistics about a streaming session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub channel: String,

    pub state: ConnectionState,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Audio frames written to the transport
    pub frames_sent: usize,

    /// Frames and control actions waiting for "listening"
    pub frames_pending: usize,

    /// Transport connections opened so far
    pub connections_opened: usize,

    /// Events surfaced to the caller
    pub events_emitted: usize,
}

/// A session event and when it was received
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub received_at: DateTime<Utc>,

    #[serde(flatten)]
    pub event: SessionEvent,
}
