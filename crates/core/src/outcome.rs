//! Terminal result of one execution attempt, as carried on the wire.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Exit code reported when the deadline fired before the process exited.
pub const TIMEOUT_EXIT_CODE: i32 = -1;

/// Why an execution did not simply run to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or oversized request, missing language or code.
    #[serde(rename = "validation_error")]
    Validation,
    /// No runner is registered for the requested language.
    UnsupportedLanguage,
    /// The runner could not be reached or answered with garbage.
    RunnerUnavailable,
    /// The compiler rejected the source.
    BuildFailed,
    /// The program outlived its deadline and was killed.
    Timeout,
    /// The runner failed on its own side (workspace, spawn).
    #[serde(rename = "infra_error")]
    Infra,
}

impl ErrorKind {
    /// Build failures and timeouts are properties of the submitted code and
    /// will repeat; everything else is transient or a client mistake.
    pub fn is_cacheable(self) -> bool {
        matches!(self, Self::BuildFailed | Self::Timeout)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::UnsupportedLanguage => "unsupported_language",
            Self::RunnerUnavailable => "runner_unavailable",
            Self::BuildFailed => "build_failed",
            Self::Timeout => "timeout",
            Self::Infra => "infra_error",
        }
    }

    /// Map a wire string (current or legacy runner message) to a kind.
    ///
    /// Empty strings mean "no error". Unknown non-empty strings are treated as
    /// an infrastructure failure so they are never cached.
    pub fn from_wire(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let kind = match value {
            "validation_error" => Self::Validation,
            "unsupported_language" => Self::UnsupportedLanguage,
            "runner_unavailable" => Self::RunnerUnavailable,
            "build_failed" => Self::BuildFailed,
            "timeout" => Self::Timeout,
            "infra_error" => Self::Infra,
            legacy if legacy.starts_with("execution timed out") => Self::Timeout,
            legacy if legacy.starts_with("build failed") => Self::BuildFailed,
            _ => Self::Infra,
        };
        Some(kind)
    }
}

/// Captured result of an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub exit_code: i32,
    /// Wall-clock milliseconds of work actually performed.
    #[serde(default, rename = "executionTime")]
    pub execution_time_ms: u64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_error_kind"
    )]
    pub error: Option<ErrorKind>,
    /// Set only on responses served from the cache.
    #[serde(default)]
    pub cached: bool,
}

impl ExecutionOutcome {
    /// The process exited on its own, with any exit code.
    pub fn completed(stdout: String, stderr: String, exit_code: i32, elapsed: Duration) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            execution_time_ms: millis(elapsed),
            error: None,
            cached: false,
        }
    }

    /// The deadline fired first. Output is whatever was captured before the kill.
    pub fn timed_out(stdout: String, stderr: String, elapsed: Duration) -> Self {
        Self {
            stdout,
            stderr,
            exit_code: TIMEOUT_EXIT_CODE,
            execution_time_ms: millis(elapsed),
            error: Some(ErrorKind::Timeout),
            cached: false,
        }
    }

    /// The compiler rejected the source; `diagnostics` become stderr.
    pub fn build_failed(diagnostics: String, exit_code: i32, elapsed: Duration) -> Self {
        Self {
            stdout: String::new(),
            stderr: diagnostics,
            exit_code,
            execution_time_ms: millis(elapsed),
            error: Some(ErrorKind::BuildFailed),
            cached: false,
        }
    }

    /// A failure before or around execution: streams empty, exit code zero.
    pub fn failure(kind: ErrorKind, elapsed: Duration) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
            execution_time_ms: millis(elapsed),
            error: Some(kind),
            cached: false,
        }
    }

    /// Whether this outcome may be stored in the result cache.
    pub fn is_cacheable(&self) -> bool {
        self.error.map_or(true, ErrorKind::is_cacheable)
    }
}

/// Error response body: the outcome shape plus a human-readable message.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    #[serde(flatten)]
    pub outcome: ExecutionOutcome,
    pub message: String,
}

impl ErrorBody {
    pub fn new(kind: ErrorKind, elapsed: Duration, message: impl Into<String>) -> Self {
        Self {
            outcome: ExecutionOutcome::failure(kind, elapsed),
            message: message.into(),
        }
    }

    /// Attach a message to an outcome produced elsewhere, keeping its fields.
    pub fn from_outcome(outcome: ExecutionOutcome, message: impl Into<String>) -> Self {
        Self {
            outcome,
            message: message.into(),
        }
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn deserialize_error_kind<'de, D>(deserializer: D) -> Result<Option<ErrorKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(ErrorKind::from_wire))
}
