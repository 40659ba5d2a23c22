pub mod client;
pub mod messages;

pub use client::{event_subject, NatsClient};
pub use messages::SessionEventMessage;
