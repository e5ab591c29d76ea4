use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coderun_core::{ErrorBody, ErrorKind, ExecutionRequest};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/process -- execute code, answering from the cache when possible.
///
/// Completed runs, build failures and timeouts are 200. A runner-side
/// infrastructure failure is passed through as 500 with the runner's outcome.
pub async fn process_code(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Response> {
    let body = body?;
    let request: ExecutionRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;

    let outcome = state.orchestrator.submit(request).await?;

    if outcome.error == Some(ErrorKind::Infra) {
        let body = ErrorBody::from_outcome(outcome, "Runner failed to execute the request");
        return Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response());
    }
    Ok(Json(outcome).into_response())
}
