use std::sync::Arc;

use coderun_core::engine::ExecutionEngine;

use crate::config::RunnerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RunnerConfig>,
    /// The engine for this runner's language.
    pub engine: Arc<ExecutionEngine>,
}

impl AppState {
    pub fn new(config: RunnerConfig) -> Self {
        let engine = ExecutionEngine::for_language(config.language, config.engine_settings());
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
        }
    }
}
