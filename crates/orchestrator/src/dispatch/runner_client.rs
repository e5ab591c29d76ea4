use std::time::Duration;

use coderun_core::{ErrorKind, ExecutionOutcome, RunRequest};

/// Longest slice of an unexpected response body kept for diagnostics.
const BODY_SNIPPET_CHARS: usize = 512;

/// Errors from talking to a runner. All of them mean "runner unavailable".
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The HTTP request itself failed (connect, DNS, deadline).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The runner answered with a non-2xx status and no usable outcome.
    #[error("Runner error ({status}): {body}")]
    Status { status: u16, body: String },

    /// A 2xx response whose body is not an outcome.
    #[error("Malformed runner response: {0}")]
    Malformed(String),
}

/// Client side of a runner's `POST /run`.
#[async_trait::async_trait]
pub trait RunnerClient: Send + Sync {
    /// Execute `request` on the runner at `base_url`, giving up after `deadline`.
    async fn run(
        &self,
        base_url: &str,
        request: &RunRequest,
        deadline: Duration,
    ) -> Result<ExecutionOutcome, RunnerError>;
}

/// [`RunnerClient`] over HTTP, sharing one pooled [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct HttpRunnerClient {
    client: reqwest::Client,
}

impl HttpRunnerClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl RunnerClient for HttpRunnerClient {
    async fn run(
        &self,
        base_url: &str,
        request: &RunRequest,
        deadline: Duration,
    ) -> Result<ExecutionOutcome, RunnerError> {
        let response = self
            .client
            .post(format!("{base_url}/run"))
            .timeout(deadline)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        interpret(status, &body)
    }
}

/// Decide what a runner response means.
///
/// A non-2xx answer is only accepted when it carries the runner's own
/// `infra_error` outcome; everything else is treated as unavailability.
fn interpret(status: reqwest::StatusCode, body: &[u8]) -> Result<ExecutionOutcome, RunnerError> {
    let parsed = serde_json::from_slice::<ExecutionOutcome>(body);
    match parsed {
        Ok(mut outcome) if status.is_success() || outcome.error == Some(ErrorKind::Infra) => {
            outcome.cached = false;
            Ok(outcome)
        }
        Err(e) if status.is_success() => Err(RunnerError::Malformed(e.to_string())),
        _ => Err(RunnerError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(body)
                .chars()
                .take(BODY_SNIPPET_CHARS)
                .collect(),
        }),
    }
}
