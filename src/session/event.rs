use crate::error::{ErrorKind, SttError, SttResult};
use crate::recognizer::StartDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input accepted by a session: audio bytes or a control action
#[derive(Debug, Clone, PartialEq)]
pub enum AudioInput {
    Data(Vec<u8>),
    Start(StartDescriptor),
    Stop,
}

impl AudioInput {
    /// Parse a control envelope: `{"action": "start", ...params}` or `{"action": "stop"}`
    pub fn from_control(value: Value) -> SttResult<Self> {
        let action = value
            .get("action")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| SttError::Configuration("control message has no action".into()))?;

        match action.as_str() {
            "start" => Ok(AudioInput::Start(StartDescriptor::from_value(value)?)),
            "stop" => Ok(AudioInput::Stop),
            other => Err(SttError::Configuration(format!(
                "unknown control action: {}",
                other
            ))),
        }
    }

    /// Parse a JSON control envelope from text
    pub fn from_control_text(text: &str) -> SttResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SttError::Configuration(format!("invalid control message: {}", e)))?;
        Self::from_control(value)
    }
}

/// Event surfaced to the caller of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Recognizer is ready for audio
    Listening { payload: Value },
    /// Any other recognizer message, verbatim
    Results { payload: Value },
    Error { kind: ErrorKind, message: String },
}

impl SessionEvent {
    pub fn error(err: &SttError) -> Self {
        SessionEvent::Error {
            kind: err.kind(),
            message: err.message().to_string(),
        }
    }

    /// Concatenated best transcript of a results message
    pub fn transcript(&self) -> Option<String> {
        let SessionEvent::Results { payload } = self else {
            return None;
        };
        let results = payload.get("results")?.as_array()?;

        let text: String = results
            .iter()
            .filter_map(|r| r.pointer("/alternatives/0/transcript").and_then(Value::as_str))
            .collect();
        Some(text)
    }

    /// Whether every result in a results message is final
    pub fn is_final(&self) -> bool {
        match self {
            SessionEvent::Results { payload } => payload
                .get("results")
                .and_then(Value::as_array)
                .map(|rs| {
                    !rs.is_empty()
                        && rs
                            .iter()
                            .all(|r| r.get("final").and_then(Value::as_bool).unwrap_or(false))
                })
                .unwrap_or(false),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transcript_joins_best_alternatives() {
        let event = SessionEvent::Results {
            payload: json!({
                "result_index": 0,
                "results": [
                    {"final": true, "alternatives": [{"transcript": "hello "}, {"transcript": "yellow "}]},
                    {"final": true, "alternatives": [{"transcript": "world"}]}
                ]
            }),
        };

        assert_eq!(event.transcript().as_deref(), Some("hello world"));
        assert!(event.is_final());
    }

    #[test]
    fn test_interim_results_not_final() {
        let event = SessionEvent::Results {
            payload: json!({"results": [{"final": false, "alternatives": [{"transcript": "hel"}]}]}),
        };
        assert!(!event.is_final());
    }

    #[test]
    fn test_control_parsing() {
        assert_eq!(
            AudioInput::from_control_text(r#"{"action":"stop"}"#).unwrap(),
            AudioInput::Stop
        );
        assert!(matches!(
            AudioInput::from_control(json!({"action": "pause"})),
            Err(SttError::Configuration(_))
        ));
        assert!(AudioInput::from_control(json!({"content-type": "audio/wav"})).is_err());
    }
}
