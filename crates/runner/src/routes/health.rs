use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Router};

use crate::state::AppState;

/// GET /health -- `OK` once the language runtime answers its probe.
async fn health_check(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.engine.probe().await {
        (StatusCode::OK, "OK")
    } else {
        tracing::warn!(language = %state.engine.language(), "Health probe failed");
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
