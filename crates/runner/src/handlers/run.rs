use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coderun_core::engine::ExecutionJob;
use coderun_core::{ErrorBody, ErrorKind, RunRequest};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /run -- execute one program and return its outcome.
///
/// Completed runs, build failures and timeouts answer 200; only failures on
/// the runner's own side answer 500. The body is parsed as JSON whatever the
/// `Content-Type`.
pub async fn run_code(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Response> {
    let body = body?;
    let request: RunRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;
    request.check()?;

    let job = ExecutionJob::from_run_request(request, &state.config.timeout_policy());
    tracing::debug!(
        language = %state.engine.language(),
        timeout_secs = job.timeout.as_secs(),
        args = job.args.len(),
        "Executing job"
    );

    let outcome = state.engine.execute(&job).await;
    if outcome.error == Some(ErrorKind::Infra) {
        let body = ErrorBody::from_outcome(outcome, "Execution failed on runner side");
        return Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response());
    }
    Ok(Json(outcome).into_response())
}
