//! Axum-specific error types and mappings.
//!
//! Maps [`EbyroidError`] to the wire format the original server used:
//! client mistakes get a plain `{"error": …}` body, engine and internal
//! failures get a 500 with the native error code attached.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ebyroid_core::EbyroidError;
use serde::Serialize;
use thiserror::Error;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Bad request (missing/invalid query parameters, unknown voiceroid).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No such route.
    #[error("not found")]
    NotFound,

    /// Engine or coordinator failure.
    #[error("internal server error: {message}")]
    Internal {
        /// Native engine error code, when one was reported.
        code: Option<i32>,
        message: String,
    },
}

/// JSON body for 4xx responses.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// JSON body for 500 responses.
#[derive(Serialize)]
struct InternalErrorBody {
    error: &'static str,
    code: Option<i32>,
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody { error: message }),
            )
                .into_response(),
            HttpError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorBody {
                    error: "not found".to_string(),
                }),
            )
                .into_response(),
            HttpError::Internal { code, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(InternalErrorBody {
                    error: "internal server error",
                    code,
                    message,
                }),
            )
                .into_response(),
        }
    }
}

impl From<EbyroidError> for HttpError {
    fn from(err: EbyroidError) -> Self {
        match err {
            EbyroidError::UnknownVoiceroid(_) => HttpError::BadRequest(err.to_string()),
            EbyroidError::Engine { code, message } => HttpError::Internal { code, message },
            // NotReady and configuration leaks are server-side problems.
            other => HttpError::Internal {
                code: None,
                message: other.to_string(),
            },
        }
    }
}
