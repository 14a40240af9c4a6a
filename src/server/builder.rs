//! ServerBuilder for fluent API to build the dashboard HTTP server

use super::handlers::{self, ServerState};
use crate::config::DashboardConfig;
use crate::core::service::RecordStore;
use anyhow::{Result, anyhow};
use axum::{Router, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builder for the dashboard API server
///
/// # Example
///
/// ```ignore
/// ServerBuilder::new()
///     .with_store(InMemoryRecordStore::new())
///     .with_config(DashboardConfig::default_config())
///     .serve("127.0.0.1:3000")
///     .await?;
/// ```
pub struct ServerBuilder {
    store: Option<Arc<dyn RecordStore>>,
    config: Option<DashboardConfig>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            store: None,
            config: None,
            custom_routes: Vec::new(),
        }
    }

    /// Set the record store (required)
    pub fn with_store(mut self, store: impl RecordStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set the configuration; defaults to [`DashboardConfig::default_config`]
    pub fn with_config(mut self, config: DashboardConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Add custom routes to the server
    ///
    /// Custom routes are merged after the built-in ones and must not
    /// overlap them.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the final router
    pub fn build(self) -> Result<Router> {
        let store = self
            .store
            .ok_or_else(|| anyhow!("RecordStore is required. Call .with_store() first."))?;

        let config = self.config.unwrap_or_else(DashboardConfig::default_config);
        config.validate()?;

        let state = ServerState::new(store, Arc::new(config));

        let api = Router::new()
            .route("/api/accounts", get(handlers::list_accounts))
            .route("/api/opportunities", get(handlers::list_opportunities))
            .route(
                "/api/metadata/scope-defaults",
                get(handlers::scope_defaults),
            )
            .route(
                "/api/metadata/fields/{object_type}",
                get(handlers::field_metadata),
            )
            .route("/api/user/me", get(handlers::current_user))
            .with_state(state);

        let mut app = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/healthz", get(handlers::health_check))
            .merge(api);

        for custom_router in self.custom_routes {
            app = app.merge(custom_router);
        }

        Ok(app
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// Stops on Ctrl+C, or SIGTERM on unix.
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
