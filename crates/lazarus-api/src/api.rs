//! Registration API router.

use crate::handlers;
use axum::{
    routing::{delete, get, post},
    Router,
};
use lazarus_core::{ConfigStore, Engine};
use std::sync::Arc;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Configuration registry.
    pub store: Arc<ConfigStore>,
    /// Container engine client.
    pub engine: Arc<dyn Engine>,
}

/// Creates the registration API router.
#[must_use]
pub fn create_router(store: Arc<ConfigStore>, engine: Arc<dyn Engine>) -> Router {
    let state = AppState { store, engine };

    Router::new()
        .route("/containers", get(handlers::list_containers))
        .route("/containers", post(handlers::register_container))
        .route("/containers/{name}", get(handlers::get_container))
        .route("/containers/{name}", delete(handlers::unregister_container))
        .with_state(state)
}
