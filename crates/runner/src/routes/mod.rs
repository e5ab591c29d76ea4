pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Execution routes.
///
/// ```text
/// POST /run    execute code
/// ```
pub fn run_routes() -> Router<AppState> {
    Router::new().route("/run", post(handlers::run::run_code))
}
