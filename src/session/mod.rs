//! Streaming speech session management
//!
//! This module provides the `StreamingSpeechSession` abstraction that manages:
//! - Connection establishment and bearer-token refresh
//! - Buffering audio while no connection is listening
//! - Forwarding recognizer events to the caller
//! - Reconnecting after unexpected closes
//!
//! `spawn_session` runs a session on its own task; callers talk to it through
//! a `SessionHandle`.

mod config;
mod driver;
mod event;
mod session;
mod stats;

pub use config::SessionConfig;
pub use driver::{spawn_session, spawn_websocket_session, SessionHandle};
pub use event::{AudioInput, SessionEvent};
pub use session::StreamingSpeechSession;
pub use stats::{ConnectionState, EventRecord, SessionStats};
