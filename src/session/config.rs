use crate::config::SttConfig;
use crate::error::{SttError, SttResult};
use crate::recognizer::{model_name, recognize_uri, RecognitionOptions, StartDescriptor};
use std::time::Duration;

/// Configuration for one streaming speech session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Logical input channel this session serves (e.g. "channel-<uuid>")
    pub channel: String,

    /// API key exchanged for bearer tokens
    pub apikey: Option<String>,

    /// Service endpoint; the public streaming endpoint when unset
    pub endpoint: Option<String>,

    /// Audio language, e.g. "en-US"
    pub language: Option<String>,

    /// Audio quality band, e.g. "BroadbandModel"
    pub band: Option<String>,

    /// Start descriptor used until a caller supplies one
    pub start: StartDescriptor,

    /// Options merged into every start descriptor
    pub options: RecognitionOptions,

    /// Suppress connection lifecycle and transport/recognizer errors
    pub muted: bool,

    /// Suppress "listening" acknowledgments
    pub discard_listening: bool,

    /// Reconnect after an unexpected close
    pub auto_reconnect: bool,

    /// Fixed delay before a reconnect
    /// Default: 1 second
    pub reconnect_delay: Duration,

    /// Consecutive reconnects without reaching "listening"; unbounded when None
    pub max_reconnect_attempts: Option<u32>,

    /// Token validity window
    /// Default: 1 hour
    pub token_validity: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel: format!("channel-{}", uuid::Uuid::new_v4()),
            apikey: None,
            endpoint: None,
            language: Some("en-US".to_string()),
            band: Some("BroadbandModel".to_string()),
            start: StartDescriptor::default(),
            options: RecognitionOptions::default(),
            muted: false,
            discard_listening: false,
            auto_reconnect: true,
            reconnect_delay: Duration::from_secs(1),
            max_reconnect_attempts: None,
            token_validity: Duration::from_secs(60 * 60),
        }
    }
}

impl SessionConfig {
    pub fn from_stt(channel: impl Into<String>, cfg: &SttConfig) -> Self {
        Self {
            channel: channel.into(),
            apikey: cfg.apikey.clone(),
            endpoint: cfg.endpoint.clone(),
            language: cfg.lang.clone(),
            band: cfg.band.clone(),
            start: StartDescriptor::default()
                .with_content_type(&cfg.content_type)
                .with_interim_results(cfg.interim_results),
            options: RecognitionOptions::from_config(cfg),
            muted: cfg.muted,
            discard_listening: cfg.discard_listening,
            auto_reconnect: cfg.auto_connect,
            reconnect_delay: Duration::from_millis(cfg.reconnect_delay_ms),
            max_reconnect_attempts: cfg.max_reconnect_attempts,
            token_validity: Duration::from_secs(cfg.token_validity_secs),
        }
    }

    /// Check credentials and model parameters before any connection attempt
    pub fn validate(&self) -> SttResult<()> {
        self.apikey()?;
        self.model()?;
        Ok(())
    }

    pub fn apikey(&self) -> SttResult<&str> {
        match self.apikey.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(SttError::Configuration(
                "Missing Speech To Text service credentials".into(),
            )),
        }
    }

    pub fn model(&self) -> SttResult<String> {
        let language = non_empty(self.language.as_deref()).ok_or_else(|| {
            SttError::Configuration(
                "Missing audio language configuration, unable to process speech.".into(),
            )
        })?;
        let band = non_empty(self.band.as_deref()).ok_or_else(|| {
            SttError::Configuration(
                "Missing audio quality configuration, unable to process speech.".into(),
            )
        })?;
        Ok(model_name(language, band))
    }

    pub fn recognize_uri(&self) -> SttResult<String> {
        Ok(recognize_uri(self.endpoint.as_deref(), &self.model()?))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
