use super::state::AppState;
use crate::error::SttError;
use crate::session::{AudioInput, EventRecord};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Optional channel ID (if not provided, generate UUID)
    pub channel: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub channel: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn stt_error_response(err: &SttError) -> Response {
    let status = match err {
        SttError::Configuration(_) => StatusCode::BAD_REQUEST,
        SttError::Token(_) => StatusCode::BAD_GATEWAY,
        SttError::Transport(_) | SttError::Protocol(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_response(status, err.to_string())
}

fn accepted(channel: &str, status: &str, message: impl Into<String>) -> Response {
    (
        StatusCode::ACCEPTED,
        Json(SessionResponse {
            channel: channel.to_string(),
            status: status.to_string(),
            message: message.into(),
        }),
    )
        .into_response()
}

async fn submit(state: &AppState, channel: &str, input: AudioInput) -> Response {
    let session = match state.get_or_create(channel).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create session {}: {}", channel, e);
            return stt_error_response(&e);
        }
    };

    match session.handle.submit(input) {
        Ok(()) => accepted(channel, "accepted", "Input queued for recognition"),
        Err(e) => {
            error!("Failed to submit to {}: {}", channel, e);
            stt_error_response(&e)
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions
/// Create a session without sending audio yet
pub async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> impl IntoResponse {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let channel = req
        .channel
        .unwrap_or_else(|| format!("channel-{}", uuid::Uuid::new_v4()));

    match state.create(&channel).await {
        Ok(Some(_)) => (
            StatusCode::CREATED,
            Json(SessionResponse {
                channel: channel.clone(),
                status: "created".to_string(),
                message: format!("Session created for channel {}", channel),
            }),
        )
            .into_response(),
        Ok(None) => error_response(
            StatusCode::CONFLICT,
            format!("Session {} already exists", channel),
        ),
        Err(e) => {
            error!("Failed to create session: {}", e);
            stt_error_response(&e)
        }
    }
}

/// POST /sessions/:channel/audio
/// Submit a chunk of audio bytes
pub async fn submit_audio(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Audio body is empty");
    }
    submit(&state, &channel, AudioInput::Data(body.to_vec())).await
}

/// POST /sessions/:channel/control
/// Submit `{"action": "start", ...}` or `{"action": "stop"}`
pub async fn submit_control(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let input = match AudioInput::from_control(body) {
        Ok(input) => input,
        Err(e) => return stt_error_response(&e),
    };
    submit(&state, &channel, input).await
}

/// POST /sessions/:channel/language
/// Override the recognizer language from the next connection on
pub async fn set_language(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Json(req): Json<LanguageRequest>,
) -> impl IntoResponse {
    if req.language.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Language must not be empty");
    }

    let session = match state.get_or_create(&channel).await {
        Ok(s) => s,
        Err(e) => return stt_error_response(&e),
    };

    match session.handle.set_language(req.language.clone()) {
        Ok(()) => accepted(
            &channel,
            "accepted",
            format!("Language set to {}", req.language),
        ),
        Err(e) => stt_error_response(&e),
    }
}

/// GET /sessions/:channel
/// Get status of a session
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> impl IntoResponse {
    match state.get(&channel).await {
        Some(session) => match session.handle.stats().await {
            Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
            Err(e) => {
                error!("Failed to get stats: {}", e);
                stt_error_response(&e)
            }
        },
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", channel),
        ),
    }
}

/// GET /sessions/:channel/events
/// Events received so far
pub async fn get_session_events(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> impl IntoResponse {
    match state.get(&channel).await {
        Some(session) => {
            let events: Vec<EventRecord> = session.events.lock().await.iter().cloned().collect();
            (StatusCode::OK, Json(events)).into_response()
        }
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", channel),
        ),
    }
}

/// DELETE /sessions/:channel
/// Shut a session down
pub async fn close_session(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> impl IntoResponse {
    info!("Closing session for channel: {}", channel);

    match state.remove(&channel).await {
        Some(session) => match session.handle.shutdown().await {
            Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
            Err(e) => {
                error!("Failed to shut down session: {}", e);
                stt_error_response(&e)
            }
        },
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", channel),
        ),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
