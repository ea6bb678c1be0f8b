//! Server module for the ClawSearch gateway

use crate::api::create_routes;
use crate::handlers::AppState;
use crate::middleware::request_id_middleware;
use axum::{middleware::from_fn, Router};
use clawsearch_core::{ClawError, GatewayConfig, Result};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// ClawSearch HTTP server
pub struct GatewayServer {
    config: GatewayConfig,
    app: Router,
}

impl GatewayServer {
    /// Create a server from configuration
    ///
    /// Does not contact SearXNG or Redis; both are reached lazily.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let state = AppState::from_config(&config)?;
        let app = create_app(state);

        Ok(Self { config, app })
    }

    /// Bind and serve until ctrl-c
    pub async fn start(self) -> Result<()> {
        let addr = self.config.bind_address()?;

        tracing::info!(
            upstream = %self.config.upstream_url,
            auth = self.config.auth_enabled(),
            external_store = self.config.external_store_url.is_some(),
            "Starting ClawSearch on {}",
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ClawError::network(format!("Failed to bind to {}: {}", addr, e)))?;

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ClawError::network(format!("Server error: {}", e)))?;

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the server configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get the router, e.g. to drive it without a socket
    pub fn router(&self) -> Router {
        self.app.clone()
    }
}

/// Wraps the routes with tracing, request ids and CORS
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_routes(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(from_fn(request_id_middleware))
            .layer(cors),
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
