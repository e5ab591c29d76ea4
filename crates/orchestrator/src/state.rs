use std::sync::Arc;

use crate::config::ServerConfig;
use crate::dispatch::Orchestrator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub orchestrator: Arc<Orchestrator>,
}
