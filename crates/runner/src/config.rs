use std::path::PathBuf;
use std::time::Duration;

use coderun_core::engine::EngineSettings;
use coderun_core::{Language, TimeoutPolicy};

/// Runner configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Language this runner executes.
    pub language: Language,
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body, in bytes.
    pub max_request_size: usize,
    /// Timeout applied when the request carries none.
    pub default_timeout_secs: u64,
    /// Upper bound for any requested timeout.
    pub max_execution_secs: u64,
    pub build_timeout_secs: u64,
    pub workspace_root: PathBuf,
    /// Bytes kept per output stream.
    pub max_output_bytes: usize,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl RunnerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                      |
    /// |------------------------|------------------------------|
    /// | `RUNNER_LANGUAGE`      | required                     |
    /// | `HOST`                 | `0.0.0.0`                    |
    /// | `PORT`                 | per-language (8081-8085)     |
    /// | `MAX_REQUEST_SIZE`     | `102400`                     |
    /// | `RUNNER_TIMEOUT`       | `10`                         |
    /// | `MAX_EXECUTION_TIME`   | `30`                         |
    /// | `BUILD_TIMEOUT_SECS`   | `30`                         |
    /// | `WORKSPACE_ROOT`       | `$TMPDIR/coderun`            |
    /// | `MAX_OUTPUT_BYTES`     | `16777216`                   |
    /// | `REQUEST_TIMEOUT_SECS` | `120`                        |
    pub fn from_env() -> Self {
        let language: Language = std::env::var("RUNNER_LANGUAGE")
            .expect("RUNNER_LANGUAGE must be set")
            .parse()
            .expect("RUNNER_LANGUAGE must be a supported language");

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .map(|p| p.parse().expect("PORT must be a valid u16"))
            .unwrap_or_else(|_| language.default_port());

        let workspace_root = std::env::var("WORKSPACE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| EngineSettings::default().workspace_root);

        Self {
            language,
            host,
            port,
            max_request_size: parse_env("MAX_REQUEST_SIZE", 102_400),
            default_timeout_secs: parse_env("RUNNER_TIMEOUT", 10),
            max_execution_secs: parse_env("MAX_EXECUTION_TIME", 30),
            build_timeout_secs: parse_env("BUILD_TIMEOUT_SECS", 30),
            workspace_root,
            max_output_bytes: parse_env("MAX_OUTPUT_BYTES", 16 * 1024 * 1024),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 120),
        }
    }

    pub fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::new(self.default_timeout_secs, self.max_execution_secs)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            workspace_root: self.workspace_root.clone(),
            build_timeout: Duration::from_secs(self.build_timeout_secs),
            max_output_bytes: self.max_output_bytes,
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid number: {e}")),
        Err(_) => default,
    }
}
