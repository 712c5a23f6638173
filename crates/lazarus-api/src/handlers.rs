//! Registration API handlers.

use crate::api::AppState;
use crate::error::{ApiError, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lazarus_core::CoreError;
use serde::Deserialize;
use serde_json::json;

/// Body for `POST /containers`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Name of an already-existing container to put under supervision.
    pub name: String,
}

/// `GET /containers` — lists supervised names.
pub async fn list_containers(State(state): State<AppState>) -> impl IntoResponse {
    let mut names: Vec<String> = state.store.snapshot().into_keys().collect();
    names.sort();
    Json(names)
}

/// `POST /containers` — registers an existing container for supervision.
///
/// Captures the engine's current configuration for the container; the
/// registry itself would accept an upsert, so duplicates are rejected here.
pub async fn register_container(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let name = request.name.trim_matches('/');
    if name.is_empty() {
        return Err(ApiError::BadRequest(
            "container name must not be empty".to_string(),
        ));
    }

    if state.store.get(name).is_some() {
        return Err(ApiError::Conflict(name.to_string()));
    }

    let details = state.engine.inspect(name).await.map_err(|e| match e {
        CoreError::NotFound(_) => ApiError::NotFound(name.to_string()),
        other => ApiError::Engine(other.to_string()),
    })?;

    // Store under the name the engine reports, sans its leading slash,
    // so the supervisor's lookup after inspect matches.
    let registered = details.name.trim_start_matches('/').to_string();
    state.store.add(&registered, details.config);
    tracing::info!(name = %registered, "container registered for supervision");

    Ok((StatusCode::CREATED, Json(json!({ "name": registered }))))
}

/// `GET /containers/{name}` — the stored launch configuration.
pub async fn get_container(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    state
        .store
        .get(&name)
        .map(Json)
        .ok_or(ApiError::NotFound(name))
}

/// `DELETE /containers/{name}` — stops supervising a name.
///
/// Idempotent; a running instance keeps running until it next dies.
pub async fn unregister_container(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    state.store.remove(&name);
    tracing::info!(name, "container unregistered");
    StatusCode::NO_CONTENT
}
