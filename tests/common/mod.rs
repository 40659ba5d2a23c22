// Shared test doubles for the transport and token authority.

#![allow(dead_code)]

use loqa_stt_stream::recognizer::{ConnectRequest, Outbound, Transport};
use loqa_stt_stream::{
    SessionConfig, SessionEvent, SttError, SttResult, StreamingSpeechSession, TokenAuthority,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const LISTENING: &str = r#"{"state":"listening"}"#;

/// Everything a mock transport was asked to do
#[derive(Debug, Default)]
pub struct TransportLog {
    pub opens: Vec<ConnectRequest>,
    pub sent: Vec<Outbound>,
    pub closes: usize,
}

impl TransportLog {
    /// Binary payloads in send order
    pub fn audio(&self) -> Vec<Vec<u8>> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                Outbound::Binary(b) => Some(b.clone()),
                Outbound::Text(_) => None,
            })
            .collect()
    }

    /// Text messages parsed as JSON, in send order
    pub fn control(&self) -> Vec<serde_json::Value> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                Outbound::Text(t) => serde_json::from_str(t).ok(),
                Outbound::Binary(_) => None,
            })
            .collect()
    }
}

pub struct MockTransport {
    log: Arc<Mutex<TransportLog>>,
    fail_sends: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> (Self, Arc<Mutex<TransportLog>>, Arc<AtomicBool>) {
        let log = Arc::new(Mutex::new(TransportLog::default()));
        let fail_sends = Arc::new(AtomicBool::new(false));
        (
            Self {
                log: Arc::clone(&log),
                fail_sends: Arc::clone(&fail_sends),
            },
            log,
            fail_sends,
        )
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn open(&mut self, request: ConnectRequest) -> SttResult<()> {
        self.log.lock().unwrap().opens.push(request);
        Ok(())
    }

    async fn send(&mut self, message: Outbound) -> SttResult<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(SttError::Transport("send failed".into()));
        }
        self.log.lock().unwrap().sent.push(message);
        Ok(())
    }

    async fn close(&mut self) -> SttResult<()> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Token authority returning "token-1", "token-2", ...
#[derive(Default)]
pub struct MockAuthority {
    pub fetches: AtomicUsize,
    pub fail: AtomicBool,
    pub delay: Option<Duration>,
}

impl MockAuthority {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TokenAuthority for MockAuthority {
    async fn fetch_token(&self, apikey: &str) -> SttResult<String> {
        assert_eq!(apikey, "test-key");
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(SttError::Token("authority unavailable".into()));
        }
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("token-{}", n))
    }
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        channel: "test-channel".to_string(),
        apikey: Some("test-key".to_string()),
        reconnect_delay: Duration::from_millis(20),
        ..Default::default()
    }
}

pub struct Harness {
    pub session: StreamingSpeechSession,
    pub log: Arc<Mutex<TransportLog>>,
    pub fail_sends: Arc<AtomicBool>,
    pub authority: Arc<MockAuthority>,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Harness {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_authority(config, Arc::new(MockAuthority::default()))
    }

    pub fn with_authority(config: SessionConfig, authority: Arc<MockAuthority>) -> Self {
        let (transport, log, fail_sends) = MockTransport::new();
        let (events_tx, events) = mpsc::unbounded_channel();
        let session = StreamingSpeechSession::new(
            config,
            Box::new(transport),
            authority.clone(),
            events_tx,
        )
        .expect("valid session config");

        Self {
            session,
            log,
            fail_sends,
            authority,
            events,
        }
    }

    /// Connect, open and acknowledge "listening"
    pub async fn reach_listening(&mut self) {
        self.session.ensure_connected().await.unwrap();
        self.session.on_transport_open().await;
        self.session.on_transport_message(LISTENING).await;
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    pub fn opens(&self) -> usize {
        self.log.lock().unwrap().opens.len()
    }

    pub fn audio(&self) -> Vec<Vec<u8>> {
        self.log.lock().unwrap().audio()
    }

    pub fn control(&self) -> Vec<serde_json::Value> {
        self.log.lock().unwrap().control()
    }
}

/// Poll `check` until it holds or two seconds pass
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
