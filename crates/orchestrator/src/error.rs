use std::time::Duration;

use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use coderun_core::{CoreError, ErrorBody, ErrorKind};

use crate::dispatch::DispatchError;

/// Application-level error type for HTTP handlers.
///
/// Every variant renders as an outcome-shaped JSON body with the matching
/// `error` kind and a human-readable `message`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `coderun_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The runner call failed or its task died.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A malformed request body.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The body exceeded `MAX_REQUEST_SIZE`.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

/// Convenience type alias for handler return values.
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

impl AppError {
    /// Outcome error kind reported for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Core(core) => core.kind(),
            AppError::Dispatch(DispatchError::RunnerUnavailable { .. }) => {
                ErrorKind::RunnerUnavailable
            }
            AppError::Dispatch(DispatchError::TaskFailed(_)) => ErrorKind::Infra,
            AppError::BadRequest(_) | AppError::PayloadTooLarge(_) => ErrorKind::Validation,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, elapsed, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, Duration::ZERO, msg.clone()),
                CoreError::UnsupportedLanguage(_) => {
                    (StatusCode::BAD_REQUEST, Duration::ZERO, core.to_string())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Duration::ZERO,
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Dispatch errors ---
            AppError::Dispatch(DispatchError::RunnerUnavailable {
                message,
                elapsed_ms,
            }) => (
                StatusCode::BAD_GATEWAY,
                Duration::from_millis(*elapsed_ms),
                format!("Runner unavailable: {message}"),
            ),
            AppError::Dispatch(DispatchError::TaskFailed(msg)) => {
                tracing::error!(error = %msg, "Dispatch task failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Duration::ZERO,
                    "An internal error occurred".to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, Duration::ZERO, msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, Duration::ZERO, msg.clone())
            }
        };

        let body = ErrorBody::new(kind, elapsed, message);
        (status, axum::Json(body)).into_response()
    }
}
