#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use coderun_cache::{CacheError, ResultCache, SharedCache};
use coderun_core::{ExecutionOutcome, RunRequest};
use coderun_orchestrator::config::ServerConfig;
use coderun_orchestrator::dispatch::{Orchestrator, RunnerClient, RunnerError};
use coderun_orchestrator::router::build_app_router;
use coderun_orchestrator::routing::RunnerRoutes;
use coderun_orchestrator::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_request_size: 102_400,
        default_timeout_secs: 10,
        max_execution_secs: 30,
        runner_call_margin_secs: 5,
        cache_url: "memory".to_string(),
        cache_ttl_secs: 3600,
        cache_op_timeout_ms: 500,
    }
}

pub fn build_orchestrator(
    routes: RunnerRoutes,
    cache: SharedCache,
    client: Arc<dyn RunnerClient>,
) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(&test_config(), routes, cache, client))
}

/// Full application router with all middleware layers around `orchestrator`.
pub fn build_test_app(orchestrator: Arc<Orchestrator>) -> Router {
    let config = test_config();
    let state = AppState {
        config: Arc::new(config.clone()),
        orchestrator,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Runner doubles
// ---------------------------------------------------------------------------

/// Runner client that records calls and answers with a fixed response.
pub struct SpyRunner {
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, RunRequest, Duration)>>,
    response: Result<ExecutionOutcome, String>,
    delay: Duration,
}

impl SpyRunner {
    pub fn returning(outcome: ExecutionOutcome) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            response: Ok(outcome),
            delay: Duration::ZERO,
        })
    }

    pub fn slow(outcome: ExecutionOutcome, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            response: Ok(outcome),
            delay,
        })
    }

    /// A runner that cannot be reached.
    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            response: Err("connection refused".to_string()),
            delay: Duration::ZERO,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Base URL, request and deadline of the most recent call.
    pub fn last_request(&self) -> Option<(String, RunRequest, Duration)> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl RunnerClient for SpyRunner {
    async fn run(
        &self,
        base_url: &str,
        request: &RunRequest,
        deadline: Duration,
    ) -> Result<ExecutionOutcome, RunnerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((base_url.to_string(), request.clone(), deadline));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response
            .clone()
            .map_err(RunnerError::Malformed)
    }
}

// ---------------------------------------------------------------------------
// Cache doubles
// ---------------------------------------------------------------------------

/// Cache whose backend is always down.
pub struct BrokenCache;

#[async_trait::async_trait]
impl ResultCache for BrokenCache {
    fn backend(&self) -> &'static str {
        "broken"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Timeout {
            op: "get",
            after: Duration::from_millis(500),
        })
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Timeout {
            op: "set",
            after: Duration::from_millis(500),
        })
    }

    async fn health_check(&self) -> Result<(), CacheError> {
        Err(CacheError::Timeout {
            op: "health_check",
            after: Duration::from_millis(500),
        })
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST raw bytes with an arbitrary content type.
pub async fn post_raw(
    app: Router,
    uri: &str,
    content_type: &str,
    body: impl Into<Body>,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(body.into())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
