pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod nats;
pub mod recognizer;
pub mod session;

pub use audio::AudioFile;
pub use config::Config;
pub use error::{ErrorKind, SttError, SttResult};
pub use http::{create_router, AppState, SessionFactory, WebSocketSessionFactory};
pub use nats::{NatsClient, SessionEventMessage};
pub use recognizer::{
    IamTokenAuthority, StartDescriptor, TokenAuthority, TokenManager, Transport, TransportEvent,
    WebSocketTransport,
};
pub use session::{
    spawn_session, spawn_websocket_session, AudioInput, ConnectionState, SessionConfig,
    SessionEvent, SessionHandle, SessionStats, StreamingSpeechSession,
};
