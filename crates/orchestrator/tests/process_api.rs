//! Integration tests for `POST /api/process`: validation, routing, caching,
//! runner failures and in-flight coalescing, with a recording runner double.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use common::{body_json, build_orchestrator, build_test_app, post_json, post_raw, BrokenCache, SpyRunner};
use serde_json::json;

use coderun_cache::{MemoryCache, SharedCache};
use coderun_core::{ErrorKind, ExecutionOutcome, ExecutionRequest, Language};
use coderun_orchestrator::dispatch::Orchestrator;
use coderun_orchestrator::routing::RunnerRoutes;

fn completed(stdout: &str) -> ExecutionOutcome {
    ExecutionOutcome::completed(stdout.into(), String::new(), 0, Duration::from_millis(12))
}

struct Harness {
    runner: Arc<SpyRunner>,
    cache: Arc<MemoryCache>,
    orchestrator: Arc<Orchestrator>,
}

fn harness(runner: Arc<SpyRunner>) -> Harness {
    let cache = Arc::new(MemoryCache::new());
    let shared: SharedCache = cache.clone();
    let orchestrator = build_orchestrator(RunnerRoutes::defaults(), shared, runner.clone());
    Harness {
        runner,
        cache,
        orchestrator,
    }
}

// ---------------------------------------------------------------------------
// Test: a fresh request runs once, the identical repeat is served from cache
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeat_request_is_served_from_cache() {
    let h = harness(SpyRunner::returning(completed("2\n")));
    let body = json!({"code": "print(1+1)", "language": "python"});

    let first = post_json(build_test_app(h.orchestrator.clone()), "/api/process", body.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["stdout"], "2\n");
    assert_eq!(first["cached"], false);

    let second = post_json(build_test_app(h.orchestrator.clone()), "/api/process", body).await;
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_json(second).await;
    assert_eq!(second["stdout"], "2\n");
    assert_eq!(second["exitCode"], first["exitCode"]);
    assert_eq!(second["cached"], true);

    assert_eq!(h.runner.calls(), 1);
}

#[tokio::test]
async fn equivalent_requests_share_a_cache_entry() {
    let h = harness(SpyRunner::returning(completed("hi\n")));

    let a = r#"{"code":"echo hi","language":"sh","env":{"A":"1","B":"2"}}"#;
    let b = r#"{ "env": {"B":"2", "A":"1"}, "language": "bash", "timeout": 10, "code": "echo hi" }"#;

    post_raw(build_test_app(h.orchestrator.clone()), "/api/process", "application/json", a).await;
    let response =
        post_raw(build_test_app(h.orchestrator.clone()), "/api/process", "application/json", b).await;

    assert_eq!(body_json(response).await["cached"], true);
    assert_eq!(h.runner.calls(), 1);
}

// ---------------------------------------------------------------------------
// Test: request is forwarded with the clamped timeout, args and env
// ---------------------------------------------------------------------------

#[tokio::test]
async fn runner_receives_normalized_request() {
    let h = harness(SpyRunner::returning(completed("")));

    let response = post_json(
        build_test_app(h.orchestrator.clone()),
        "/api/process",
        json!({
            "code": "package main",
            "language": "golang",
            "timeout": 300,
            "args": ["--flag", "value"],
            "env": {"MODE": "test"}
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let (base_url, request, deadline) = h.runner.last_request().expect("runner called");
    assert_eq!(base_url, Language::Go.default_runner_url());
    assert_eq!(request.code, "package main");
    assert_eq!(request.timeout, Some(30));
    assert_eq!(request.args, vec!["--flag".to_string(), "value".to_string()]);
    assert_eq!(request.env.get("MODE").map(String::as_str), Some("test"));
    // Effective timeout plus the configured call margin.
    assert_eq!(deadline, Duration::from_secs(35));
}

// ---------------------------------------------------------------------------
// Test: validation and unsupported languages never reach runner or cache
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_code_is_a_validation_error() {
    let h = harness(SpyRunner::returning(completed("")));

    let response = post_json(
        build_test_app(h.orchestrator.clone()),
        "/api/process",
        json!({"language": "python"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "validation_error");
    assert_eq!(json["stdout"], "");
    assert!(json["message"].as_str().unwrap().contains("code"));
    assert_eq!(h.runner.calls(), 0);
}

#[tokio::test]
async fn negative_timeout_is_a_validation_error() {
    let h = harness(SpyRunner::returning(completed("")));

    let response = post_json(
        build_test_app(h.orchestrator.clone()),
        "/api/process",
        json!({"code": "x", "language": "python", "timeout": -1}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");
    assert_eq!(h.runner.calls(), 0);
}

#[tokio::test]
async fn unknown_language_is_rejected_without_side_effects() {
    let h = harness(SpyRunner::returning(completed("")));

    let response = post_json(
        build_test_app(h.orchestrator.clone()),
        "/api/process",
        json!({"code": "IDENTIFICATION DIVISION.", "language": "cobol"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "unsupported_language");
    assert_eq!(h.runner.calls(), 0);
    assert!(h.cache.is_empty().await);
}

#[tokio::test]
async fn unrouted_language_is_unsupported() {
    let runner = SpyRunner::returning(completed(""));
    let cache: SharedCache = Arc::new(MemoryCache::new());
    let routes = RunnerRoutes::empty().with_route(Language::Python, "http://python-runner:8084");
    let orchestrator = build_orchestrator(routes, cache, runner.clone());

    let response = post_json(
        build_test_app(orchestrator),
        "/api/process",
        json!({"code": "echo hi", "language": "sh"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "unsupported_language");
    assert_eq!(runner.calls(), 0);
}

// ---------------------------------------------------------------------------
// Test: cacheability of each outcome class
// ---------------------------------------------------------------------------

#[tokio::test]
async fn timeouts_are_cached() {
    let outcome = ExecutionOutcome::timed_out("partial".into(), String::new(), Duration::from_secs(1));
    let h = harness(SpyRunner::returning(outcome));
    let body = json!({"code": "while True: pass", "language": "python", "timeout": 1});

    let first = post_json(build_test_app(h.orchestrator.clone()), "/api/process", body.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["error"], "timeout");
    assert_eq!(first["exitCode"], -1);

    let second = body_json(post_json(build_test_app(h.orchestrator.clone()), "/api/process", body).await).await;
    assert_eq!(second["cached"], true);
    assert_eq!(second["error"], "timeout");
    assert_eq!(h.runner.calls(), 1);
}

#[tokio::test]
async fn build_failures_are_cached() {
    let outcome = ExecutionOutcome::build_failed("syntax error".into(), 2, Duration::from_millis(40));
    let h = harness(SpyRunner::returning(outcome));
    let body = json!({"code": "package main\nfunc main( {", "language": "go"});

    let first = body_json(post_json(build_test_app(h.orchestrator.clone()), "/api/process", body.clone()).await).await;
    assert_eq!(first["error"], "build_failed");
    assert_eq!(first["stderr"], "syntax error");

    let second = body_json(post_json(build_test_app(h.orchestrator.clone()), "/api/process", body).await).await;
    assert_eq!(second["cached"], true);
    assert_eq!(h.runner.calls(), 1);
}

#[tokio::test]
async fn runner_unavailable_is_502_and_not_cached() {
    let h = harness(SpyRunner::unavailable());
    let body = json!({"code": "print(1)", "language": "python"});

    let first = post_json(build_test_app(h.orchestrator.clone()), "/api/process", body.clone()).await;
    assert_eq!(first.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(first).await;
    assert_eq!(json["error"], "runner_unavailable");
    assert!(json["message"].as_str().unwrap().contains("connection refused"));

    let second = post_json(build_test_app(h.orchestrator.clone()), "/api/process", body).await;
    assert_eq!(second.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(h.runner.calls(), 2);
    assert!(h.cache.is_empty().await);
}

#[tokio::test]
async fn runner_infra_errors_pass_through_uncached() {
    let outcome = ExecutionOutcome::failure(ErrorKind::Infra, Duration::from_millis(3));
    let h = harness(SpyRunner::returning(outcome));
    let body = json!({"code": "print(1)", "language": "python"});

    let first = post_json(build_test_app(h.orchestrator.clone()), "/api/process", body.clone()).await;
    assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(first).await;
    assert_eq!(json["error"], "infra_error");
    assert_eq!(json["executionTime"], 3);
    assert!(!json["message"].as_str().unwrap().is_empty());

    post_json(build_test_app(h.orchestrator.clone()), "/api/process", body).await;
    assert_eq!(h.runner.calls(), 2);
    assert!(h.cache.is_empty().await);
}

// ---------------------------------------------------------------------------
// Test: a broken cache degrades to always-miss
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cache_failures_are_treated_as_misses() {
    let runner = SpyRunner::returning(completed("ok\n"));
    let orchestrator = build_orchestrator(RunnerRoutes::defaults(), Arc::new(BrokenCache), runner.clone());
    let body = json!({"code": "print('ok')", "language": "python"});

    for _ in 0..2 {
        let response = post_json(build_test_app(orchestrator.clone()), "/api/process", body.clone()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["stdout"], "ok\n");
        assert_eq!(json["cached"], false);
    }
    assert_eq!(runner.calls(), 2);
}

#[tokio::test]
async fn undecodable_cache_entries_are_ignored() {
    let h = harness(SpyRunner::returning(completed("fresh\n")));
    let request: ExecutionRequest =
        serde_json::from_value(json!({"code": "print('fresh')", "language": "python"})).unwrap();

    // Run once so the entry exists, then overwrite it with garbage.
    h.orchestrator.submit(request.clone()).await.unwrap();
    let key = {
        let normalized = request
            .clone()
            .normalize(&common::test_config().timeout_policy())
            .unwrap();
        coderun_core::Fingerprint::of(&normalized).cache_key()
    };
    coderun_cache::ResultCache::set(h.cache.as_ref(), &key, "not json", Duration::from_secs(60))
        .await
        .unwrap();

    let outcome = h.orchestrator.submit(request).await.unwrap();
    assert_eq!(outcome.stdout, "fresh\n");
    assert!(!outcome.cached);
    assert_eq!(h.runner.calls(), 2);
}

// ---------------------------------------------------------------------------
// Test: concurrent identical requests share one runner call
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_duplicates_are_coalesced() {
    let h = harness(SpyRunner::slow(completed("once\n"), Duration::from_millis(300)));
    let request: ExecutionRequest =
        serde_json::from_value(json!({"code": "print('once')", "language": "python"})).unwrap();

    let submissions = (0..5).map(|_| {
        let orchestrator = h.orchestrator.clone();
        let request = request.clone();
        tokio::spawn(async move { orchestrator.submit(request).await })
    });
    let results = futures::future::join_all(submissions).await;

    for result in results {
        let outcome = result.expect("task").expect("submit");
        assert_eq!(outcome.stdout, "once\n");
    }
    assert_eq!(h.runner.calls(), 1);
    assert!(h.orchestrator.inflight().is_empty());
}

#[tokio::test]
async fn different_requests_are_not_coalesced() {
    let h = harness(SpyRunner::slow(completed(""), Duration::from_millis(100)));
    let a: ExecutionRequest =
        serde_json::from_value(json!({"code": "print(1)", "language": "python"})).unwrap();
    let b: ExecutionRequest =
        serde_json::from_value(json!({"code": "print(2)", "language": "python"})).unwrap();

    let (ra, rb) = tokio::join!(h.orchestrator.submit(a), h.orchestrator.submit(b));
    ra.unwrap();
    rb.unwrap();

    assert_eq!(h.runner.calls(), 2);
}

// ---------------------------------------------------------------------------
// Test: body handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn body_is_parsed_regardless_of_content_type() {
    let h = harness(SpyRunner::returning(completed("2\n")));

    let response = post_raw(
        build_test_app(h.orchestrator.clone()),
        "/api/process",
        "text/plain",
        r#"{"code":"print(1+1)","language":"python"}"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["stdout"], "2\n");
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let h = harness(SpyRunner::returning(completed("")));

    let response = post_raw(
        build_test_app(h.orchestrator.clone()),
        "/api/process",
        "application/json",
        "{\"code\": ",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");
}

#[tokio::test]
async fn oversized_body_is_413() {
    let h = harness(SpyRunner::returning(completed("")));
    let code = "x".repeat(200 * 1024);

    let response = post_json(
        build_test_app(h.orchestrator.clone()),
        "/api/process",
        json!({"code": code, "language": "python"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["error"], "validation_error");
    assert_eq!(h.runner.calls(), 0);
}
