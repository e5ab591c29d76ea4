#![allow(dead_code)]

use std::path::Path;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use coderun_core::Language;
use coderun_runner::config::RunnerConfig;
use coderun_runner::router::build_app_router;
use coderun_runner::state::AppState;

/// Shell runner config rooted at a test-owned workspace directory.
pub fn test_config(workspace_root: &Path) -> RunnerConfig {
    RunnerConfig {
        language: Language::Shell,
        host: "127.0.0.1".to_string(),
        port: 0,
        max_request_size: 102_400,
        default_timeout_secs: 5,
        max_execution_secs: 10,
        build_timeout_secs: 10,
        workspace_root: workspace_root.to_path_buf(),
        max_output_bytes: 16 * 1024 * 1024,
        request_timeout_secs: 30,
    }
}

pub fn build_test_app(config: RunnerConfig) -> Router {
    build_app_router(AppState::new(config))
}

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
