use serde::{Deserialize, Serialize};

/// Errors raised by a streaming speech session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SttError {
    /// Missing credentials or required recognizer parameters.
    /// Detected before any connection attempt.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Socket-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Error reported by the recognizer itself
    #[error("Recognizer error: {0}")]
    Protocol(String),

    /// Token refresh failed
    #[error("Token error: {0}")]
    Token(String),
}

impl SttError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SttError::Configuration(_) => ErrorKind::Configuration,
            SttError::Transport(_) => ErrorKind::Transport,
            SttError::Protocol(_) => ErrorKind::Protocol,
            SttError::Token(_) => ErrorKind::Token,
        }
    }

    /// Message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            SttError::Configuration(m)
            | SttError::Transport(m)
            | SttError::Protocol(m)
            | SttError::Token(m) => m,
        }
    }
}

/// Error category as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Transport,
    Protocol,
    Token,
}

pub type SttResult<T> = std::result::Result<T, SttError>;
