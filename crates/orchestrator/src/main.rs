use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coderun_orchestrator::config::ServerConfig;
use coderun_orchestrator::dispatch::{HttpRunnerClient, Orchestrator};
use coderun_orchestrator::router::build_app_router;
use coderun_orchestrator::routing::RunnerRoutes;
use coderun_orchestrator::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coderun_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Routing table ---
    let routes = RunnerRoutes::from_env();
    for language in routes.languages() {
        tracing::info!(
            %language,
            runner = routes.resolve(language).unwrap_or_default(),
            "Runner route"
        );
    }

    // --- Result cache ---
    let cache = coderun_cache::connect(&config.cache_url, config.cache_op_timeout())
        .expect("Invalid CACHE_URL");
    match cache.health_check().await {
        Ok(()) => tracing::info!("Cache health check passed"),
        Err(e) => tracing::warn!(error = %e, "Cache unreachable at startup, continuing without hits"),
    }

    // --- App state ---
    let orchestrator = Orchestrator::new(
        &config,
        routes,
        cache,
        Arc::new(HttpRunnerClient::new()),
    );
    let state = AppState {
        config: Arc::new(config.clone()),
        orchestrator: Arc::new(orchestrator),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
