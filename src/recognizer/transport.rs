use crate::error::SttResult;
use tokio::sync::mpsc;

/// Parameters for opening a recognizer connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub uri: String,
    /// Bearer token for the `Authorization` header
    pub bearer: Option<String>,
}

/// A message written to the recognizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// JSON control message (`start` / `stop`)
    Text(String),
    /// Audio bytes
    Binary(Vec<u8>),
}

/// Events reported by a transport after `open`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    Message(String),
    Close,
    Error(String),
}

pub type TransportEvents = mpsc::UnboundedReceiver<TransportEvent>;

/// Bidirectional message channel to the recognizer.
///
/// `open` only starts the connection attempt; the outcome is reported later
/// as `Open`, or as `Error` followed by `Close`, on the event channel the
/// transport was created with. Every opened connection ends with exactly one
/// `Close`.
#[async_trait::async_trait]
pub trait Transport: Send {
    async fn open(&mut self, request: ConnectRequest) -> SttResult<()>;

    async fn send(&mut self, message: Outbound) -> SttResult<()>;

    async fn close(&mut self) -> SttResult<()>;

    /// Transport name for logging
    fn name(&self) -> &str;
}
