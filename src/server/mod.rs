//! HTTP server module
//!
//! Provides the Axum-based HTTP server for serving metrics.

pub mod handlers;

use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::collector::OneClient;
use crate::config::Config;
use crate::labeling::PoolRenderer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Inventory HTTP client
    pub client: Arc<OneClient>,
    /// Pool renderer with rules compiled at startup
    pub renderer: Arc<PoolRenderer>,
}

impl AppState {
    /// Build the client and renderer for a validated configuration
    pub fn new(config: Config) -> Result<Self> {
        let client = crate::build_client(&config)?;
        let renderer = PoolRenderer::new(
            config.exporter.namespace.clone(),
            Arc::new(config.labels.clone()),
        );

        Ok(Self {
            config: Arc::new(config),
            client: Arc::new(client),
            renderer: Arc::new(renderer),
        })
    }
}

/// Build the router with the configured metrics path
pub fn router(state: AppState) -> Router {
    let metrics_path = state.config.exporter.metrics_path.clone();

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(&metrics_path, get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
///
/// # Errors
/// Returns an error if the client cannot be built or the listener fails
pub async fn run(config: Config) -> Result<()> {
    let addr = config.socket_addr()?;
    let metrics_path = config.exporter.metrics_path.clone();

    let state = AppState::new(config)?;
    let app = router(state);

    info!(address = %addr, metrics_path = %metrics_path, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
