use std::time::Duration;

use coderun_core::TimeoutPolicy;

/// Orchestrator configuration loaded from environment variables.
///
/// All fields have defaults suitable for the compose deployment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`).
    pub request_timeout_secs: u64,
    /// Maximum accepted request body, in bytes (default: `102400`).
    pub max_request_size: usize,
    /// Execution timeout used when the request has none (default: `10`).
    pub default_timeout_secs: u64,
    /// Ceiling for requested timeouts (default: `30`).
    pub max_execution_secs: u64,
    /// Added to the effective timeout to bound one runner call (default: `35`).
    pub runner_call_margin_secs: u64,
    /// Cache backend URL; empty disables caching, `memory` keeps it in-process.
    pub cache_url: String,
    /// Lifetime of cached outcomes in seconds (default: `3600`).
    pub cache_ttl_secs: u64,
    /// Deadline for a single cache operation in milliseconds (default: `500`).
    pub cache_op_timeout_ms: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                  |
    /// |---------------------------|--------------------------|
    /// | `HOST`                    | `0.0.0.0`                |
    /// | `PORT`                    | `8000`                   |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS`    | `120`                    |
    /// | `MAX_REQUEST_SIZE`        | `102400`                 |
    /// | `RUNNER_TIMEOUT`          | `10`                     |
    /// | `MAX_EXECUTION_TIME`      | `30`                     |
    /// | `RUNNER_CALL_MARGIN_SECS` | `35`                     |
    /// | `CACHE_URL`               | `redis://redis:6379`     |
    /// | `CACHE_TTL_SECS`          | `3600`                   |
    /// | `CACHE_OP_TIMEOUT_MS`     | `500`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let cache_url =
            std::env::var("CACHE_URL").unwrap_or_else(|_| "redis://redis:6379".into());

        Self {
            host,
            port: parse_env("PORT", 8000),
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 120),
            max_request_size: parse_env("MAX_REQUEST_SIZE", 102_400),
            default_timeout_secs: parse_env("RUNNER_TIMEOUT", 10),
            max_execution_secs: parse_env("MAX_EXECUTION_TIME", 30),
            runner_call_margin_secs: parse_env("RUNNER_CALL_MARGIN_SECS", 35),
            cache_url,
            cache_ttl_secs: parse_env("CACHE_TTL_SECS", 3600),
            cache_op_timeout_ms: parse_env("CACHE_OP_TIMEOUT_MS", 500),
        }
    }

    pub fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::new(self.default_timeout_secs, self.max_execution_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_op_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_op_timeout_ms)
    }

    pub fn runner_call_margin(&self) -> Duration {
        Duration::from_secs(self.runner_call_margin_secs)
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
