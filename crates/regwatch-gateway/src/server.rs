//! Gateway server: shared state, router and listener.

use axum::Router;
use axum::routing::{get, post};
use regwatch_core::config::GatewayConfig;
use regwatch_core::traits::ComplianceStore;
use regwatch_dispatch::RunCoordinator;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::routes;

/// State shared by every handler.
pub struct AppState {
    pub coordinator: Arc<RunCoordinator>,
    pub store: Arc<dyn ComplianceStore>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(coordinator: Arc<RunCoordinator>, store: Arc<dyn ComplianceStore>) -> Self {
        Self { coordinator, store, start_time: std::time::Instant::now() }
    }
}

/// Build the router with all routes mounted.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/api/notify", post(routes::trigger_run))
        .route("/api/deliveries", get(routes::list_deliveries))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct GatewayServer {
    config: GatewayConfig,
    state: Arc<AppState>,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, state: AppState) -> Self {
        Self { config, state: Arc::new(state) }
    }

    /// Bind and serve until the process is stopped.
    pub async fn start(self) -> regwatch_core::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("RegWatch gateway listening on http://{addr}");
        tracing::info!("  POST /api/notify      run trigger");
        tracing::info!("  GET  /api/deliveries  recent delivery attempts");
        axum::serve(listener, build_router(self.state)).await?;
        Ok(())
    }
}
