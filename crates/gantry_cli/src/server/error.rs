use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use gantry_core::CoreError;

/// Unified API error type for all route handlers.
#[derive(Debug)]
pub enum ApiError {
    Unprocessable(String),
    Plan { kind: String, message: String },
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unprocessable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: msg,
                    kind: None,
                },
            ),
            ApiError::Plan { kind, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: message,
                    kind: Some(kind),
                },
            ),
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: msg,
                        kind: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidRequest(_) => ApiError::Unprocessable(e.to_string()),
            CoreError::Plan(ref source) => ApiError::Plan {
                kind: source.kind().to_string(),
                message: e.to_string(),
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}
