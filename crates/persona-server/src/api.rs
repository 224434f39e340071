//! API handlers for the avatar-video proxy.

use crate::avatar::AvatarError;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use persona_types::{Role, TalkRequest};
use persona_voice::{avatar_voice_id, DEFAULT_AVATAR_VOICE};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Longest text accepted for one talk, in characters.
pub const MAX_TALK_TEXT_CHARS: usize = 5000;

/// Longest talk id accepted on the status route.
const MAX_TALK_ID_LEN: usize = 128;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = axum::Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<AvatarError> for ApiError {
    fn from(e: AvatarError) -> Self {
        tracing::warn!("avatar API call failed: {}", e);
        ApiError::InternalServerError(e.to_string())
    }
}

/// Handler for `POST /api/talk`.
///
/// Maps the role to a voice and forwards the text to the avatar API,
/// returning its JSON verbatim.
pub async fn talk_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<TalkRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }
    let chars = text.chars().count();
    if chars > MAX_TALK_TEXT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "text is too long: {} characters (limit: {})",
            chars, MAX_TALK_TEXT_CHARS
        )));
    }

    let voice_id = match Role::new(&payload.role) {
        Ok(role) => avatar_voice_id(&role),
        Err(_) => DEFAULT_AVATAR_VOICE,
    };

    tracing::info!(
        role = %payload.role,
        voice_id,
        text_chars = chars,
        "forwarding talk request"
    );

    let upstream = state.avatar.create_talk(text, voice_id).await?;
    Ok(Json(upstream))
}

/// Handler for `GET /api/talk/{talkId}`.
pub async fn talk_status_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(talk_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let valid = !talk_id.is_empty()
        && talk_id.len() <= MAX_TALK_ID_LEN
        && talk_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(ApiError::BadRequest(format!("invalid talk id: {}", talk_id)));
    }

    let upstream = state.avatar.get_talk(&talk_id).await?;
    Ok(Json(upstream))
}
