use super::config::SessionConfig;
use super::event::{AudioInput, SessionEvent};
use super::stats::{ConnectionState, SessionStats};
use crate::error::{SttError, SttResult};
use crate::recognizer::{
    stt_language, ConnectRequest, Outbound, StartDescriptor, TokenAuthority, TokenManager,
    Transport, TransportEvent,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Queued work awaiting the recognizer's "listening" state
#[derive(Debug, Clone)]
enum Pending {
    Audio(Vec<u8>),
    Stop,
}

/// One logical audio stream to the recognizer, spanning any number of
/// physical connections.
///
/// All handlers take `&mut self`; the driver task runs them one at a time.
pub struct StreamingSpeechSession {
    config: SessionConfig,
    transport: Box<dyn Transport>,
    tokens: TokenManager,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: ConnectionState,
    start: StartDescriptor,
    pending: VecDeque<Pending>,
    shutting_down: bool,
    reconnect_at: Option<Instant>,
    reconnect_attempts: u32,
    started_at: chrono::DateTime<Utc>,
    frames_sent: usize,
    connections_opened: usize,
    events_emitted: usize,
}

impl StreamingSpeechSession {
    /// Create a session. Fails with a configuration error when credentials or
    /// model parameters are missing.
    pub fn new(
        config: SessionConfig,
        transport: Box<dyn Transport>,
        authority: Arc<dyn TokenAuthority>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> SttResult<Self> {
        config.validate()?;

        let tokens = TokenManager::new(
            authority,
            config.apikey()?.to_string(),
            config.token_validity,
        );

        info!(
            "Creating speech session: {} (transport={})",
            config.channel,
            transport.name()
        );

        Ok(Self {
            start: config.start.clone(),
            config,
            transport,
            tokens,
            events,
            state: ConnectionState::Disconnected,
            pending: VecDeque::new(),
            shutting_down: false,
            reconnect_at: None,
            reconnect_attempts: 0,
            started_at: Utc::now(),
            frames_sent: 0,
            connections_opened: 0,
            events_emitted: 0,
        })
    }

    pub fn channel(&self) -> &str {
        &self.config.channel
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// When a scheduled reconnect is due, if any
    pub fn reconnect_deadline(&self) -> Option<Instant> {
        self.reconnect_at
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    pub fn start_descriptor(&self) -> &StartDescriptor {
        &self.start
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            channel: self.config.channel.clone(),
            state: self.state,
            started_at: self.started_at,
            frames_sent: self.frames_sent,
            frames_pending: self.pending.len(),
            connections_opened: self.connections_opened,
            events_emitted: self.events_emitted,
        }
    }

    /// Change the recognizer language. Applies from the next connection.
    ///
    /// Short codes such as `fr` are expanded to the recognizer's `fr-FR` form.
    pub fn set_language(&mut self, language: &str) -> SttResult<()> {
        let language = stt_language(language)?;
        info!("[{}] language override: {}", self.config.channel, language);
        self.config.language = Some(language);
        Ok(())
    }

    /// Accept audio or a control action.
    ///
    /// Audio is written immediately while listening and queued otherwise.
    /// A `start` replaces the descriptor used for the next connection.
    pub async fn submit_audio(&mut self, input: AudioInput) -> SttResult<()> {
        if self.shutting_down {
            return Err(SttError::Configuration(format!(
                "session {} has been shut down",
                self.config.channel
            )));
        }

        let item = match input {
            AudioInput::Start(descriptor) => {
                debug!("[{}] new start descriptor", self.config.channel);
                self.start = descriptor;
                return self.ensure_connected().await;
            }
            AudioInput::Data(bytes) => Pending::Audio(bytes),
            AudioInput::Stop => {
                if self.state != ConnectionState::Listening && self.pending.is_empty() {
                    debug!("[{}] stop with no audio to finalize, ignored", self.config.channel);
                    return Ok(());
                }
                Pending::Stop
            }
        };

        self.pending.push_back(item);

        if self.state == ConnectionState::Listening {
            self.flush_pending().await;
            Ok(())
        } else {
            self.ensure_connected().await
        }
    }

    /// Open a connection unless one is open or already being established
    pub async fn ensure_connected(&mut self) -> SttResult<()> {
        if self.shutting_down || self.state != ConnectionState::Disconnected {
            return Ok(());
        }

        self.reconnect_at = None;
        self.state = ConnectionState::Connecting;

        let request = match self.config.recognize_uri() {
            Ok(uri) => self.tokens.token().await.map(|token| ConnectRequest {
                uri,
                bearer: Some(token.value),
            }),
            Err(e) => Err(e),
        };

        let request = match request {
            Ok(request) => request,
            Err(e) => {
                warn!("[{}] connect aborted: {}", self.config.channel, e);
                self.state = ConnectionState::Disconnected;
                self.emit(SessionEvent::error(&e));
                return Err(e);
            }
        };

        if let Err(e) = self.transport.open(request).await {
            warn!("[{}] transport open failed: {}", self.config.channel, e);
            self.state = ConnectionState::Disconnected;
            self.emit(SessionEvent::error(&e));
            return Err(e);
        }

        self.connections_opened += 1;
        info!(
            "[{}] connecting (connection #{})",
            self.config.channel, self.connections_opened
        );
        Ok(())
    }

    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Open => self.on_transport_open().await,
            TransportEvent::Message(text) => self.on_transport_message(&text).await,
            TransportEvent::Close => self.on_transport_close(),
            TransportEvent::Error(err) => self.on_transport_error(&err),
        }
    }

    /// Send the start descriptor on a freshly opened transport
    pub async fn on_transport_open(&mut self) {
        if self.shutting_down {
            debug!("[{}] opened during shutdown, closing", self.config.channel);
            let _ = self.transport.close().await;
            return;
        }

        let start = self.start.merged_with(&self.config.options);
        debug!("[{}] sending start: {}", self.config.channel, start.to_json());

        if let Err(e) = self.transport.send(Outbound::Text(start.to_json())).await {
            self.on_transport_error(e.message());
            return;
        }

        self.state = ConnectionState::Open;
    }

    /// Classify a recognizer message: error, "listening" acknowledgment, or results
    pub async fn on_transport_message(&mut self, payload: &str) {
        let value: Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(e) => {
                warn!("[{}] unparseable recognizer message: {}", self.config.channel, e);
                if !self.config.muted {
                    let err = SttError::Protocol(format!("unparseable message: {}", e));
                    self.emit(SessionEvent::error(&err));
                }
                return;
            }
        };

        if let Some(error) = value.get("error") {
            let message = error
                .as_str()
                .map(str::to_owned)
                .unwrap_or_else(|| error.to_string());
            warn!("[{}] recognizer error: {}", self.config.channel, message);

            // The only error the recognizer has been seen to send is an expired token.
            self.tokens.invalidate().await;

            if !self.config.muted {
                self.emit(SessionEvent::error(&SttError::Protocol(message)));
            }
            return;
        }

        if value.get("state").and_then(Value::as_str) == Some("listening") {
            if self.shutting_down {
                return;
            }
            info!("[{}] recognizer listening", self.config.channel);
            self.state = ConnectionState::Listening;
            self.reconnect_attempts = 0;
            self.flush_pending().await;

            if !self.config.discard_listening {
                self.emit(SessionEvent::Listening { payload: value });
            }
            return;
        }

        self.emit(SessionEvent::Results { payload: value });
    }

    pub fn on_transport_close(&mut self) {
        info!("[{}] recognizer connection closed", self.config.channel);
        self.state = ConnectionState::Disconnected;

        if self.shutting_down {
            return;
        }

        if !self.config.muted {
            let err = SttError::Transport("recognizer connection closed".into());
            self.emit(SessionEvent::error(&err));
        }

        if !self.config.auto_reconnect {
            return;
        }

        if let Some(max) = self.config.max_reconnect_attempts {
            if self.reconnect_attempts >= max {
                warn!(
                    "[{}] giving up after {} reconnect attempts",
                    self.config.channel, self.reconnect_attempts
                );
                let err = SttError::Transport(format!(
                    "reconnect abandoned after {} attempts",
                    self.reconnect_attempts
                ));
                // The next submission starts a fresh cycle with a full budget.
                self.reconnect_attempts = 0;
                self.emit(SessionEvent::error(&err));
                return;
            }
        }

        self.reconnect_attempts += 1;
        self.reconnect_at = Some(Instant::now() + self.config.reconnect_delay);
        debug!(
            "[{}] reconnect #{} in {:?}",
            self.config.channel, self.reconnect_attempts, self.config.reconnect_delay
        );
    }

    pub fn on_transport_error(&mut self, err: &str) {
        warn!("[{}] transport error: {}", self.config.channel, err);
        if !self.config.muted {
            self.emit(SessionEvent::error(&SttError::Transport(err.to_string())));
        }
    }

    /// Fire a scheduled reconnect
    pub async fn on_reconnect_timer(&mut self) -> SttResult<()> {
        self.reconnect_at = None;
        if self.shutting_down {
            return Ok(());
        }
        self.ensure_connected().await
    }

    /// Stop the stream for good: no further reconnects, queued audio discarded
    pub async fn shutdown(&mut self) {
        if self.shutting_down {
            return;
        }
        info!("[{}] shutting down", self.config.channel);

        self.shutting_down = true;
        self.reconnect_at = None;

        if self.state == ConnectionState::Listening {
            if let Err(e) = self.transport.send(stop_message()).await {
                warn!("[{}] failed to send stop: {}", self.config.channel, e);
            }
        }

        if !self.pending.is_empty() {
            debug!(
                "[{}] discarding {} queued items",
                self.config.channel,
                self.pending.len()
            );
            self.pending.clear();
        }

        if self.state != ConnectionState::Disconnected {
            self.state = ConnectionState::Closing;
            if let Err(e) = self.transport.close().await {
                warn!("[{}] failed to close transport: {}", self.config.channel, e);
            }
        }
    }

    /// Drain the queue in order while listening. A `stop` pauses draining
    /// until the recognizer acknowledges with "listening" again.
    async fn flush_pending(&mut self) {
        while self.state == ConnectionState::Listening {
            let Some(item) = self.pending.pop_front() else {
                break;
            };

            let message = match &item {
                Pending::Audio(bytes) => Outbound::Binary(bytes.clone()),
                Pending::Stop => stop_message(),
            };

            if let Err(e) = self.transport.send(message).await {
                self.pending.push_front(item);
                self.on_transport_error(e.message());
                break;
            }

            match item {
                Pending::Audio(_) => self.frames_sent += 1,
                Pending::Stop => {
                    debug!("[{}] stop sent", self.config.channel);
                    self.state = ConnectionState::Open;
                }
            }
        }
    }

    fn emit(&mut self, event: SessionEvent) {
        self.events_emitted += 1;
        if self.events.send(event).is_err() {
            debug!("[{}] event receiver dropped", self.config.channel);
        }
    }
}

fn stop_message() -> Outbound {
    Outbound::Text(json!({ "action": "stop" }).to_string())
}
