//! Registration API server.

use crate::api::create_router;
use crate::error::{ApiError, Result};
use lazarus_core::{ConfigStore, Engine};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Registration API server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP listen address.
    pub listen_addr: SocketAddr,
}

/// Registration API server.
pub struct ApiServer {
    config: ServerConfig,
    store: Arc<ConfigStore>,
    engine: Arc<dyn Engine>,
}

impl ApiServer {
    /// Creates a new registration API server.
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<ConfigStore>, engine: Arc<dyn Engine>) -> Self {
        Self {
            config,
            store,
            engine,
        }
    }

    /// Runs the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or the server
    /// fails.
    pub async fn run(&self) -> Result<()> {
        let app = create_router(Arc::clone(&self.store), Arc::clone(&self.engine))
            .layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind(self.config.listen_addr)
            .await
            .map_err(|e| ApiError::Server(format!("failed to bind {}: {e}", self.config.listen_addr)))?;

        tracing::info!(addr = %self.config.listen_addr, "registration API listening");

        axum::serve(listener, app)
            .await
            .map_err(|e| ApiError::Server(e.to_string()))
    }
}
