use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, info, warn};
use serde_json::Value;

use super::AppState;
use crate::error::ChatError;
use crate::models::{ErrorBody, HealthStatus, Message, NewMessage, DEFAULT_SENDER};

pub const INTERNAL_ERROR_BODY: &str = "Something went wrong!";
pub const OBJECT_REQUIRED: &str = "Request body must be a JSON object";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// Detail is logged, never sent to the caller
    Internal(String),
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::Validation(reason) => ApiError::BadRequest(reason),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason),
            ApiError::NotFound(reason) => (StatusCode::NOT_FOUND, reason),
            ApiError::Internal(detail) => {
                error!("Unhandled server error: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY.to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}

pub async fn list_messages(State(state): State<AppState>) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state.store.list_messages().await?;
    Ok(Json(messages))
}

pub async fn post_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Vec<Message>>), ApiError> {
    let request = read_new_message(&headers, &body)?;

    let text = request.text.unwrap_or_default();
    let sender = request.sender.unwrap_or_else(|| DEFAULT_SENDER.to_string());

    let [user_message, server_message] = state.store.append_user_message(&text, &sender).await?;
    info!(
        "Accepted message {} from {} ({} chars)",
        user_message.id,
        sender,
        text.chars().count()
    );

    Ok((StatusCode::CREATED, Json(vec![user_message, server_message])))
}

/// Decode a message body. A body that is not JSON, or is empty, carries no text.
fn read_new_message(headers: &HeaderMap, body: &[u8]) -> Result<NewMessage, ApiError> {
    if !is_json(headers) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(NewMessage::default());
    }

    let Json(value) = Json::<Value>::from_bytes(body).map_err(|rejection| {
        warn!("Rejected message body: {}", rejection.body_text());
        ApiError::BadRequest(rejection.body_text())
    })?;

    // Only an object has fields; arrays must not bind positionally
    if !value.is_object() {
        warn!("Rejected non-object message body");
        return Err(ApiError::BadRequest(OBJECT_REQUIRED.to_string()));
    }
    serde_json::from_value(value).map_err(|e| {
        warn!("Rejected message body: {}", e);
        ApiError::BadRequest(format!("Invalid message body: {}", e))
    })
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
