use crate::config::SttConfig;
use crate::error::{SttError, SttResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// The `start` control message that opens a recognition request.
///
/// Kept as a JSON object so caller-supplied parameters the recognizer
/// understands are passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StartDescriptor(Map<String, Value>);

impl Default for StartDescriptor {
    fn default() -> Self {
        let mut map = Map::new();
        map.insert("action".into(), json!("start"));
        map.insert("content-type".into(), json!("audio/wav"));
        map.insert("interim_results".into(), json!(true));
        Self(map)
    }
}

impl StartDescriptor {
    /// Build from a caller's control envelope. `action` is forced to `start`.
    pub fn from_value(value: Value) -> SttResult<Self> {
        match value {
            Value::Object(mut map) => {
                map.insert("action".into(), json!("start"));
                Ok(Self(map))
            }
            other => Err(SttError::Configuration(format!(
                "start descriptor must be a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.0.insert("content-type".into(), json!(content_type));
        self
    }

    pub fn with_interim_results(mut self, interim: bool) -> Self {
        self.0.insert("interim_results".into(), json!(interim));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Copy with the configured recognition options layered on top
    pub fn merged_with(&self, options: &RecognitionOptions) -> Self {
        let mut map = self.0.clone();
        if let Some(n) = options.max_alternatives {
            map.insert("max_alternatives".into(), json!(n));
        }
        if options.speaker_labels {
            map.insert("speaker_labels".into(), json!(true));
        }
        if options.smart_formatting {
            map.insert("smart_formatting".into(), json!(true));
        }
        if options.word_confidence {
            map.insert("word_confidence".into(), json!(true));
        }
        if !options.keywords.is_empty() {
            map.insert("keywords".into(), json!(options.keywords));
            map.insert("keywords_threshold".into(), json!(options.keywords_threshold));
        }
        Self(map)
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

/// Recognizer options applied to every start descriptor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionOptions {
    pub max_alternatives: Option<u32>,
    pub speaker_labels: bool,
    pub smart_formatting: bool,
    pub word_confidence: bool,
    pub keywords: Vec<String>,
    pub keywords_threshold: f64,
}

impl RecognitionOptions {
    pub fn from_config(cfg: &SttConfig) -> Self {
        Self {
            max_alternatives: cfg.alternatives,
            speaker_labels: cfg.speaker_labels,
            smart_formatting: cfg.smart_formatting,
            word_confidence: cfg.word_confidence,
            keywords: cfg.keywords.as_deref().map(parse_keywords).unwrap_or_default(),
            keywords_threshold: cfg.keywords_threshold.unwrap_or(0.0),
        }
    }
}

/// Parse a keyword list such as `"[alpha, beta]"` or `"alpha,beta"`
pub fn parse_keywords(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('[').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(']').unwrap_or(trimmed);

    trimmed
        .split(',')
        .map(|k| k.trim().trim_matches('"').to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Recognizer model name, e.g. `en-US_BroadbandModel`
pub fn model_name(language: &str, band: &str) -> String {
    format!("{}_{}", language, band)
}

/// Region used for bare language codes
const DEFAULT_REGIONS: &[(&str, &str)] = &[
    ("ar", "AR"),
    ("de", "DE"),
    ("en", "US"),
    ("es", "ES"),
    ("fr", "FR"),
    ("it", "IT"),
    ("ja", "JP"),
    ("ko", "KR"),
    ("nl", "NL"),
    ("pt", "BR"),
    ("zh", "CN"),
];

/// Normalize a language to the recognizer's `ll-RR` form.
///
/// `fr` becomes `fr-FR` and `en-gb` becomes `en-GB`. A bare code with no
/// known region is rejected.
pub fn stt_language(language: &str) -> SttResult<String> {
    let language = language.trim();
    if language.is_empty() {
        return Err(SttError::Configuration("language must not be empty".into()));
    }

    let (lang, region) = match language.split_once(['-', '_']) {
        Some((lang, region)) if !lang.is_empty() && !region.is_empty() => {
            (lang.to_ascii_lowercase(), region.to_ascii_uppercase())
        }
        Some(_) => {
            return Err(SttError::Configuration(format!(
                "invalid language code: {}",
                language
            )))
        }
        None => {
            let lang = language.to_ascii_lowercase();
            let region = DEFAULT_REGIONS
                .iter()
                .find(|(code, _)| *code == lang)
                .map(|(_, region)| region.to_string())
                .ok_or_else(|| {
                    SttError::Configuration(format!("unsupported language: {}", language))
                })?;
            (lang, region)
        }
    };

    Ok(format!("{}-{}", lang, region))
}

const DEFAULT_RECOGNIZE_URI: &str =
    "wss://stream.watsonplatform.net/speech-to-text/api/v1/recognize";

/// Streaming recognize URI for an optional service endpoint
pub fn recognize_uri(endpoint: Option<&str>, model: &str) -> String {
    let base = match endpoint {
        Some(ep) if !ep.trim().is_empty() => {
            let ep = ep.trim().trim_end_matches('/');
            let ep = if let Some(rest) = ep.strip_prefix("https://") {
                format!("wss://{}", rest)
            } else if let Some(rest) = ep.strip_prefix("http://") {
                format!("ws://{}", rest)
            } else {
                ep.to_string()
            };
            format!("{}/v1/recognize", ep)
        }
        _ => DEFAULT_RECOGNIZE_URI.to_string(),
    };
    format!("{}?model={}", base, model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords_brackets() {
        assert_eq!(parse_keywords("[alpha, beta ,gamma]"), vec!["alpha", "beta", "gamma"]);
        assert_eq!(parse_keywords("one"), vec!["one"]);
        assert!(parse_keywords("[]").is_empty());
    }

    #[test]
    fn test_stt_language_expands_short_codes() {
        assert_eq!(stt_language("fr").unwrap(), "fr-FR");
        assert_eq!(stt_language(" EN ").unwrap(), "en-US");
        assert_eq!(stt_language("pt").unwrap(), "pt-BR");
        assert_eq!(stt_language("en-gb").unwrap(), "en-GB");
        assert_eq!(stt_language("es_ES").unwrap(), "es-ES");
    }

    #[test]
    fn test_stt_language_rejects_unknown_codes() {
        assert!(matches!(stt_language("xx"), Err(SttError::Configuration(_))));
        assert!(matches!(stt_language(""), Err(SttError::Configuration(_))));
        assert!(matches!(stt_language("fr-"), Err(SttError::Configuration(_))));
    }

    #[test]
    fn test_recognize_uri_rewrites_endpoint() {
        let uri = recognize_uri(
            Some("https://api.eu-de.speech-to-text.example.com/instances/abc/"),
            "en-US_BroadbandModel",
        );
        assert_eq!(
            uri,
            "wss://api.eu-de.speech-to-text.example.com/instances/abc/v1/recognize?model=en-US_BroadbandModel"
        );
    }

    #[test]
    fn test_recognize_uri_default() {
        let uri = recognize_uri(None, "fr-FR_NarrowbandModel");
        assert!(uri.starts_with(DEFAULT_RECOGNIZE_URI));
        assert!(uri.ends_with("?model=fr-FR_NarrowbandModel"));
    }

    #[test]
    fn test_merge_keeps_caller_fields() {
        let start = StartDescriptor::from_value(json!({
            "action": "start",
            "content-type": "audio/l16;rate=16000",
            "inactivity_timeout": -1
        }))
        .unwrap();
        let options = RecognitionOptions {
            max_alternatives: Some(3),
            keywords: vec!["hello".into()],
            ..Default::default()
        };

        let merged = start.merged_with(&options);
        assert_eq!(merged.get("inactivity_timeout"), Some(&json!(-1)));
        assert_eq!(merged.get("max_alternatives"), Some(&json!(3)));
        assert_eq!(merged.get("keywords"), Some(&json!(["hello"])));
        assert_eq!(merged.get("keywords_threshold"), Some(&json!(0.0)));
        assert_eq!(merged.get("speaker_labels"), None);
    }
}
