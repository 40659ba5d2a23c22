// Tests for configuration loading and per-session config derivation

use anyhow::Result;
use loqa_stt_stream::{Config, SessionConfig, SttError};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

const MINIMAL: &str = r#"
[service]
name = "loqa-stt-stream"

[service.http]
bind = "127.0.0.1"
port = 3100

[stt]
apikey = "file-key"
lang = "en-GB"
band = "NarrowbandModel"
"#;

fn write_config(contents: &str) -> Result<(TempDir, String)> {
    let dir = TempDir::new()?;
    let path = dir.path().join("stt.toml");
    fs::write(&path, contents)?;
    let path = path.to_string_lossy().to_string();
    Ok((dir, path))
}

#[test]
fn test_minimal_config_defaults() -> Result<()> {
    let (_dir, path) = write_config(MINIMAL)?;
    let cfg = Config::load(&path)?;

    assert_eq!(cfg.service.http.port, 3100);
    assert_eq!(cfg.service.http.event_history, 1000);
    assert_eq!(cfg.stt.content_type, "audio/wav");
    assert!(cfg.stt.interim_results);
    assert!(cfg.stt.auto_connect);
    assert!(!cfg.stt.muted);
    assert!(!cfg.stt.discard_listening);
    assert_eq!(cfg.stt.reconnect_delay_ms, 1000);
    assert_eq!(cfg.stt.token_validity_secs, 3600);
    assert_eq!(cfg.stt.max_reconnect_attempts, None);
    assert_eq!(cfg.stt.iam_url, "https://iam.cloud.ibm.com/identity/token");
    assert_eq!(cfg.nats.url, None);
    assert_eq!(cfg.stream.chunk_ms, 100);

    Ok(())
}

#[test]
fn test_session_config_from_stt() -> Result<()> {
    let contents = format!(
        "{}\nendpoint = \"https://stt.example.com/instances/42\"\nalternatives = 3\nkeywords = \"[colorado, tornado]\"\nkeywords_threshold = 0.4\nmuted = true\nreconnect_delay_ms = 250\n",
        MINIMAL.trim_end()
    );
    let (_dir, path) = write_config(&contents)?;
    let cfg = Config::load(&path)?;

    let session = SessionConfig::from_stt("flow-1", &cfg.stt);
    assert_eq!(session.channel, "flow-1");
    assert!(session.muted);
    assert_eq!(session.reconnect_delay, Duration::from_millis(250));
    assert_eq!(session.token_validity, Duration::from_secs(3600));
    assert_eq!(session.options.max_alternatives, Some(3));
    assert_eq!(session.options.keywords, vec!["colorado", "tornado"]);
    assert_eq!(session.options.keywords_threshold, 0.4);
    assert_eq!(session.model()?, "en-GB_NarrowbandModel");
    assert_eq!(
        session.recognize_uri()?,
        "wss://stt.example.com/instances/42/v1/recognize?model=en-GB_NarrowbandModel"
    );
    assert!(session.validate().is_ok());

    Ok(())
}

#[test]
fn test_missing_language_is_configuration_error() -> Result<()> {
    let contents = MINIMAL.replace("lang = \"en-GB\"\n", "");
    let (_dir, path) = write_config(&contents)?;
    let cfg = Config::load(&path)?;

    let session = SessionConfig::from_stt("flow-1", &cfg.stt);
    match session.validate() {
        Err(SttError::Configuration(msg)) => assert!(msg.contains("language")),
        other => panic!("expected configuration error, got {:?}", other),
    }

    Ok(())
}

#[test]
fn test_missing_file_fails() {
    assert!(Config::load("/nonexistent/loqa-stt-stream").is_err());
}

#[test]
fn test_default_session_config() {
    let cfg = SessionConfig::default();

    assert!(cfg.channel.starts_with("channel-"));
    assert!(cfg.auto_reconnect);
    assert_eq!(cfg.reconnect_delay, Duration::from_secs(1));
    assert_eq!(cfg.token_validity, Duration::from_secs(3600));
    assert!(matches!(cfg.validate(), Err(SttError::Configuration(_))), "no apikey by default");
}
