//! HTTP API for feeding sessions from an enclosing flow
//!
//! - POST /sessions - Create a session (optional channel ID)
//! - GET /sessions/:channel - Session status
//! - DELETE /sessions/:channel - Shut a session down
//! - POST /sessions/:channel/audio - Submit audio bytes
//! - POST /sessions/:channel/control - Submit a start/stop action
//! - POST /sessions/:channel/language - Override the recognizer language
//! - GET /sessions/:channel/events - Events received so far
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{
    AppState, ChannelSession, SessionFactory, WebSocketSessionFactory, DEFAULT_EVENT_HISTORY,
};
