use std::time::Duration;

use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use coderun_core::{CoreError, ErrorBody, ErrorKind};

/// Application-level error type for runner handlers.
///
/// Only request problems end up here; execution failures are outcomes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(rejection.body_text())
        } else {
            Self::BadRequest(rejection.body_text())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, ErrorKind::Validation, msg.clone())
                }
                CoreError::UnsupportedLanguage(_) => (
                    StatusCode::BAD_REQUEST,
                    ErrorKind::UnsupportedLanguage,
                    core.to_string(),
                ),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorKind::Infra,
                        "An internal error occurred".to_string(),
                    )
                }
            },
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorKind::Validation, msg.clone())
            }
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, ErrorKind::Validation, msg.clone())
            }
        };

        let body = ErrorBody::new(kind, Duration::ZERO, message);
        (status, axum::Json(body)).into_response()
    }
}
