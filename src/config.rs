use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub stt: SttConfig,
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,

    /// Events retained per channel for `GET /sessions/:channel/events`
    #[serde(default = "default_event_history")]
    pub event_history: usize,
}

/// Recognizer credentials, model selection and streaming policy
#[derive(Debug, Clone, Deserialize)]
pub struct SttConfig {
    /// Long-lived API key exchanged for bearer tokens
    pub apikey: Option<String>,

    /// Service endpoint (https://...); the public streaming endpoint is used when unset
    pub endpoint: Option<String>,

    /// IAM token endpoint
    #[serde(default = "default_iam_url")]
    pub iam_url: String,

    /// Audio language, e.g. "en-US"
    pub lang: Option<String>,

    /// Audio quality band, e.g. "BroadbandModel"
    pub band: Option<String>,

    #[serde(default = "default_content_type")]
    pub content_type: String,

    #[serde(default = "default_true")]
    pub interim_results: bool,

    pub alternatives: Option<u32>,

    #[serde(default)]
    pub speaker_labels: bool,

    #[serde(default)]
    pub smart_formatting: bool,

    #[serde(default)]
    pub word_confidence: bool,

    /// Keyword spotting list, e.g. "[alpha,beta]"
    pub keywords: Option<String>,

    pub keywords_threshold: Option<f64>,

    /// Suppress connection lifecycle and error events
    #[serde(default)]
    pub muted: bool,

    /// Suppress the recognizer's "listening" acknowledgments
    #[serde(default)]
    pub discard_listening: bool,

    /// Reconnect after an unexpected close
    #[serde(default = "default_true")]
    pub auto_connect: bool,

    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Consecutive reconnects allowed without reaching "listening" (unbounded when unset)
    pub max_reconnect_attempts: Option<u32>,

    #[serde(default = "default_token_validity_secs")]
    pub token_validity_secs: u64,
}

/// Optional event publication to NATS
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NatsConfig {
    pub url: Option<String>,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

/// Settings for the `stream` command
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Duration of each PCM chunk sent to the recognizer
    #[serde(default = "default_chunk_ms")]
    pub chunk_ms: u64,

    /// How long to wait for trailing results after the last chunk
    #[serde(default = "default_idle_secs")]
    pub idle_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_ms: default_chunk_ms(),
            idle_secs: default_idle_secs(),
        }
    }
}

fn default_event_history() -> usize {
    1000
}

fn default_iam_url() -> String {
    "https://iam.cloud.ibm.com/identity/token".to_string()
}

fn default_content_type() -> String {
    "audio/wav".to_string()
}

fn default_true() -> bool {
    true
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_token_validity_secs() -> u64 {
    60 * 60
}

fn default_subject_prefix() -> String {
    "stt.events".to_string()
}

fn default_chunk_ms() -> u64 {
    100
}

fn default_idle_secs() -> u64 {
    5
}

impl Config {
    /// Load from `path` (any format the `config` crate understands), with
    /// `LOQA_STT__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("LOQA_STT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
