//! Recognizer-facing plumbing
//!
//! - `descriptor`: the `start` message, model naming and endpoint URIs
//! - `token`: bearer token acquisition and caching
//! - `transport`: the transport capability the session drives
//! - `websocket`: the WebSocket implementation of that capability

pub mod descriptor;
pub mod token;
pub mod transport;
pub mod websocket;

pub use descriptor::{
    model_name, parse_keywords, recognize_uri, stt_language, RecognitionOptions, StartDescriptor,
};
pub use token::{IamTokenAuthority, Token, TokenAuthority, TokenManager};
pub use transport::{ConnectRequest, Outbound, Transport, TransportEvent, TransportEvents};
pub use websocket::WebSocketTransport;
