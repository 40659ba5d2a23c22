use crate::config::SttConfig;
use crate::error::SttResult;
use crate::nats::NatsClient;
use crate::recognizer::TokenAuthority;
use crate::session::{
    spawn_websocket_session, EventRecord, SessionConfig, SessionEvent, SessionHandle,
};
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{error, info};

/// Starts a running session for a channel
pub trait SessionFactory: Send + Sync {
    fn create(
        &self,
        config: SessionConfig,
    ) -> SttResult<(SessionHandle, mpsc::UnboundedReceiver<SessionEvent>)>;
}

/// Sessions backed by the recognizer's WebSocket endpoint
pub struct WebSocketSessionFactory {
    pub authority: Arc<dyn TokenAuthority>,
}

impl SessionFactory for WebSocketSessionFactory {
    fn create(
        &self,
        config: SessionConfig,
    ) -> SttResult<(SessionHandle, mpsc::UnboundedReceiver<SessionEvent>)> {
        spawn_websocket_session(config, Arc::clone(&self.authority))
    }
}

/// Events kept per channel unless configured otherwise
pub const DEFAULT_EVENT_HISTORY: usize = 1000;

/// A running session and its most recent events, oldest first
pub struct ChannelSession {
    pub handle: SessionHandle,
    pub events: Arc<Mutex<VecDeque<EventRecord>>>,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active sessions (channel → session)
    pub sessions: Arc<RwLock<HashMap<String, Arc<ChannelSession>>>>,
    pub stt: Arc<SttConfig>,
    pub factory: Arc<dyn SessionFactory>,
    pub publisher: Option<Arc<NatsClient>>,
    /// Maximum events retained per channel
    pub event_history: usize,
}

impl AppState {
    pub fn new(
        stt: SttConfig,
        factory: Arc<dyn SessionFactory>,
        publisher: Option<Arc<NatsClient>>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            stt: Arc::new(stt),
            factory,
            publisher,
            event_history: DEFAULT_EVENT_HISTORY,
        }
    }

    pub fn with_event_history(mut self, event_history: usize) -> Self {
        self.event_history = event_history.max(1);
        self
    }

    pub async fn get(&self, channel: &str) -> Option<Arc<ChannelSession>> {
        self.sessions.read().await.get(channel).cloned()
    }

    /// Session for `channel`, created on first use
    pub async fn get_or_create(&self, channel: &str) -> SttResult<Arc<ChannelSession>> {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(channel) {
            return Ok(Arc::clone(existing));
        }

        let session = self.start_session(channel)?;
        sessions.insert(channel.to_string(), Arc::clone(&session));
        Ok(session)
    }

    /// Create a session for `channel`; `None` if one already exists
    pub async fn create(&self, channel: &str) -> SttResult<Option<Arc<ChannelSession>>> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(channel) {
            return Ok(None);
        }

        let session = self.start_session(channel)?;
        sessions.insert(channel.to_string(), Arc::clone(&session));
        Ok(Some(session))
    }

    fn start_session(&self, channel: &str) -> SttResult<Arc<ChannelSession>> {
        let config = SessionConfig::from_stt(channel, &self.stt);
        let (handle, events_rx) = self.factory.create(config)?;

        let events = Arc::new(Mutex::new(VecDeque::new()));
        tokio::spawn(collect_events(
            channel.to_string(),
            events_rx,
            Arc::clone(&events),
            self.event_history,
            self.publisher.clone(),
        ));

        info!("Session created for channel: {}", channel);
        Ok(Arc::new(ChannelSession { handle, events }))
    }

    pub async fn remove(&self, channel: &str) -> Option<Arc<ChannelSession>> {
        self.sessions.write().await.remove(channel)
    }
}

async fn collect_events(
    channel: String,
    mut events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    events: Arc<Mutex<VecDeque<EventRecord>>>,
    capacity: usize,
    publisher: Option<Arc<NatsClient>>,
) {
    while let Some(event) = events_rx.recv().await {
        if let Some(publisher) = &publisher {
            if let Err(e) = publisher.publish_event(&channel, &event).await {
                error!("Failed to publish event for {}: {}", channel, e);
            }
        }

        let mut events = events.lock().await;
        while events.len() >= capacity {
            events.pop_front();
        }
        events.push_back(EventRecord {
            received_at: Utc::now(),
            event,
        });
    }
}
