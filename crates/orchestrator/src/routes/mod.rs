pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// POST /process    execute code
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/process", post(handlers::process::process_code))
}
