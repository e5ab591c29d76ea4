use axum::extract::State;
use axum::{routing::get, Json, Router};
use coderun_core::Language;
use serde::Serialize;

use crate::state::AppState;

/// Detailed health payload.
#[derive(Serialize)]
pub struct HealthDetails {
    /// `ok`, or `degraded` when the cache is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub cache_backend: &'static str,
    pub cache_healthy: bool,
    /// Languages that currently have a runner route.
    pub languages: Vec<Language>,
}

/// GET /health -- liveness.
async fn health_check() -> &'static str {
    "OK"
}

/// GET /health/details -- cache reachability and the routing table.
async fn health_details(State(state): State<AppState>) -> Json<HealthDetails> {
    let cache = state.orchestrator.cache();
    let cache_healthy = match cache.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Cache health check failed");
            false
        }
    };

    Json(HealthDetails {
        status: if cache_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        cache_backend: cache.backend(),
        cache_healthy,
        languages: state.orchestrator.routes().languages(),
    })
}

/// Mount health routes (root level, not under `/api`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/details", get(health_details))
}
