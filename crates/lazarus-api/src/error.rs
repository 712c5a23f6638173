//! Error types for the registration API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur in registration API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Container not found.
    #[error("no such container: {0}")]
    NotFound(String),

    /// Name is already supervised.
    #[error("container already registered: {0}")]
    Conflict(String),

    /// Invalid request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The engine call behind the request failed.
    #[error("engine error: {0}")]
    Engine(String),

    /// Server error.
    #[error("server error: {0}")]
    Server(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Engine(_) => StatusCode::BAD_GATEWAY,
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "message": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}
