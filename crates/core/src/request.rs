//! Inbound request models, validation, and timeout normalization.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::CoreError;
use crate::language::Language;

/// Body of `POST /api/process`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ExecutionRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "code must not be empty"))]
    pub code: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "language must be specified"))]
    pub language: String,
    /// Requested timeout in seconds. Absent or zero means "use the default".
    #[serde(default)]
    #[validate(range(min = 0, message = "timeout must not be negative"))]
    pub timeout: Option<i64>,
    #[serde(default)]
    #[validate(custom(function = "validate_args"))]
    pub args: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_env"))]
    pub env: BTreeMap<String, String>,
}

/// A validated request with a canonical language and an effective timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub code: String,
    pub language: Language,
    pub timeout_secs: u64,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

/// Body of a runner's `POST /run`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Default and ceiling for execution timeouts, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub default_secs: u64,
    pub max_secs: u64,
}

impl TimeoutPolicy {
    pub fn new(default_secs: u64, max_secs: u64) -> Self {
        Self {
            default_secs,
            max_secs,
        }
    }

    /// Resolve the timeout actually enforced for a requested value.
    ///
    /// Positive requests are clamped to `max_secs`; anything else falls back
    /// to the default, which is clamped too. Never below one second.
    pub fn effective_secs(&self, requested: Option<i64>) -> u64 {
        let secs = match requested {
            Some(r) if r > 0 => (r as u64).min(self.max_secs),
            _ => self.default_secs.min(self.max_secs),
        };
        secs.max(1)
    }

    pub fn effective(&self, requested: Option<i64>) -> Duration {
        Duration::from_secs(self.effective_secs(requested))
    }
}

impl ExecutionRequest {
    /// Validate the request and resolve it into its canonical form.
    pub fn normalize(self, policy: &TimeoutPolicy) -> Result<NormalizedRequest, CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(describe(&e)))?;

        let language: Language = self.language.parse()?;
        let timeout_secs = policy.effective_secs(self.timeout);

        Ok(NormalizedRequest {
            code: self.code,
            language,
            timeout_secs,
            args: self.args,
            env: self.env,
        })
    }
}

impl NormalizedRequest {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The body forwarded to the language's runner.
    pub fn to_run_request(&self) -> RunRequest {
        RunRequest {
            code: self.code.clone(),
            args: self.args.clone(),
            env: self.env.clone(),
            timeout: Some(self.timeout_secs),
        }
    }
}

impl RunRequest {
    /// Runner-side validation: only the code is mandatory.
    pub fn check(&self) -> Result<(), CoreError> {
        if self.code.is_empty() {
            return Err(CoreError::Validation("code is required".to_string()));
        }
        validate_args(&self.args).map_err(|e| CoreError::Validation(e.to_string()))?;
        validate_env(&self.env).map_err(|e| CoreError::Validation(e.to_string()))?;
        Ok(())
    }
}

fn validate_args(args: &Vec<String>) -> Result<(), ValidationError> {
    if args.iter().any(|a| a.contains('\0')) {
        return Err(ValidationError::new("nul_in_args")
            .with_message("args must not contain NUL bytes".into()));
    }
    Ok(())
}

fn validate_env(env: &BTreeMap<String, String>) -> Result<(), ValidationError> {
    for (key, value) in env {
        if key.is_empty() || key.contains('=') || key.contains('\0') {
            return Err(ValidationError::new("invalid_env_key")
                .with_message(format!("invalid environment variable name: {key:?}").into()));
        }
        if value.contains('\0') {
            return Err(ValidationError::new("nul_in_env")
                .with_message(format!("environment variable {key} contains a NUL byte").into()));
        }
    }
    Ok(())
}

/// Flatten validator errors into one human-readable line.
fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}
