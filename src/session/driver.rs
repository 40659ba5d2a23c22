use super::config::SessionConfig;
use super::event::{AudioInput, SessionEvent};
use super::session::StreamingSpeechSession;
use super::stats::SessionStats;
use crate::error::{SttError, SttResult};
use crate::recognizer::{TokenAuthority, TransportEvents, WebSocketTransport};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

enum SessionCommand {
    Submit(AudioInput),
    SetLanguage(String),
    Stats(oneshot::Sender<SessionStats>),
    Shutdown(oneshot::Sender<SessionStats>),
}

/// Caller side of a running session
#[derive(Clone)]
pub struct SessionHandle {
    channel: String,
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn submit(&self, input: AudioInput) -> SttResult<()> {
        self.send(SessionCommand::Submit(input))
    }

    pub fn set_language(&self, language: impl Into<String>) -> SttResult<()> {
        self.send(SessionCommand::SetLanguage(language.into()))
    }

    pub async fn stats(&self) -> SttResult<SessionStats> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Stats(tx))?;
        rx.await.map_err(|_| self.gone())
    }

    /// Shut the session down and wait for its final statistics
    pub async fn shutdown(&self) -> SttResult<SessionStats> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Shutdown(tx))?;
        rx.await.map_err(|_| self.gone())
    }

    fn send(&self, command: SessionCommand) -> SttResult<()> {
        self.commands.send(command).map_err(|_| self.gone())
    }

    fn gone(&self) -> SttError {
        SttError::Configuration(format!("session {} is no longer running", self.channel))
    }
}

/// Run `session` on its own task.
///
/// Caller commands, transport events and the reconnect timer are handled one
/// at a time, each to completion.
pub fn spawn_session(
    session: StreamingSpeechSession,
    transport_events: TransportEvents,
) -> (SessionHandle, JoinHandle<()>) {
    let (commands, commands_rx) = mpsc::unbounded_channel();
    let handle = SessionHandle {
        channel: session.channel().to_string(),
        commands,
    };

    let task = tokio::spawn(run(session, commands_rx, transport_events));
    (handle, task)
}

/// Build a WebSocket-backed session and start it
pub fn spawn_websocket_session(
    config: SessionConfig,
    authority: Arc<dyn TokenAuthority>,
) -> SttResult<(SessionHandle, mpsc::UnboundedReceiver<SessionEvent>)> {
    let (transport, transport_events) = WebSocketTransport::new();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let session = StreamingSpeechSession::new(config, Box::new(transport), authority, events_tx)?;
    let (handle, _task) = spawn_session(session, transport_events);

    Ok((handle, events_rx))
}

async fn run(
    mut session: StreamingSpeechSession,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    mut transport_events: TransportEvents,
) {
    info!("Session task started: {}", session.channel());

    loop {
        let deadline = session.reconnect_deadline();

        tokio::select! {
            command = commands.recv() => match command {
                Some(SessionCommand::Submit(input)) => {
                    // Failures are already surfaced as session events.
                    if let Err(e) = session.submit_audio(input).await {
                        debug!("[{}] submission: {}", session.channel(), e);
                    }
                }
                Some(SessionCommand::SetLanguage(language)) => {
                    if let Err(e) = session.set_language(&language) {
                        warn!("[{}] {}", session.channel(), e);
                    }
                }
                Some(SessionCommand::Stats(reply)) => {
                    let _ = reply.send(session.stats());
                }
                Some(SessionCommand::Shutdown(reply)) => {
                    session.shutdown().await;
                    let _ = reply.send(session.stats());
                    break;
                }
                None => {
                    session.shutdown().await;
                    break;
                }
            },
            Some(event) = transport_events.recv() => {
                session.handle_transport_event(event).await;
            }
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)), if deadline.is_some() => {
                if let Err(e) = session.on_reconnect_timer().await {
                    debug!("[{}] reconnect: {}", session.channel(), e);
                }
            }
        }
    }

    info!("Session task stopped: {}", session.channel());
}
