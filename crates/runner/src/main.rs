use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coderun_core::engine::workspace::purge_stale;
use coderun_runner::config::RunnerConfig;
use coderun_runner::router::build_app_router;
use coderun_runner::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "coderun_runner=debug,coderun_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = RunnerConfig::from_env();
    tracing::info!(
        language = %config.language,
        host = %config.host,
        port = %config.port,
        workspace_root = %config.workspace_root.display(),
        "Loaded runner configuration"
    );

    // --- Workspace root ---
    match purge_stale(&config.workspace_root) {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "Removed stale workspaces"),
        Err(e) => tracing::warn!(error = %e, "Failed to purge stale workspaces"),
    }

    // --- App state ---
    let state = AppState::new(config.clone());
    if state.engine.probe().await {
        tracing::info!(language = %config.language, "Language runtime available");
    } else {
        tracing::warn!(language = %config.language, "Language runtime probe failed; health will report NOT READY");
    }

    let app = build_app_router(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting runner");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
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
