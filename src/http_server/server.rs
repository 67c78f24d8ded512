//! # HTTP Server
//!
//! Main HTTP server combining the health and spatial routers.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, LayerRegistry};
use crate::store::{ConnectionProvider, PgProvider};

use super::config::HttpServerConfig;
use super::observability_routes::health_routes;
use super::spatial_routes::{spatial_routes, SpatialState};

/// HTTP Server for the spatial layer API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server backed by PostgreSQL from the loaded configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_provider(
            config.server.clone(),
            PgProvider::new(&config.database),
            config.layers.clone(),
        )
    }

    /// Create a server over any connection provider
    pub fn with_provider<P: ConnectionProvider>(
        config: HttpServerConfig,
        provider: P,
        layers: LayerRegistry,
    ) -> Self {
        let state = Arc::new(SpatialState::new(provider, layers));
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    fn build_router<P: ConnectionProvider>(
        config: &HttpServerConfig,
        state: Arc<SpatialState<P>>,
    ) -> Router {
        // Configure CORS from config
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            use tower_http::cors::AllowOrigin;
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            // Health check at root level
            .merge(health_routes())
            // Spatial routes under /api
            .nest("/api", spatial_routes(state))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl-C
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!(%addr, "geoportal HTTP server listening");
        tracing::info!("API endpoints: /api/layers, /api/states, /api/districts, /api/geojson/{{table}}, /api/filter/{{table}}, /api/columns/{{table}}");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("geoportal HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
