//! # lazarus-api
//!
//! HTTP registration surface for Lazarus.
//!
//! Thin CRUD over the configuration registry:
//!
//! - `GET /containers` — supervised names
//! - `POST /containers` — put an already-running container under supervision
//! - `GET /containers/{name}` — stored launch configuration
//! - `DELETE /containers/{name}` — stop supervising a name
//!
//! Registering a name captures the engine's current configuration for that
//! container; from then on the supervisor recreates it whenever it dies.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod error;
pub mod handlers;
pub mod server;

pub use api::{create_router, AppState};
pub use error::{ApiError, Result};
pub use server::{ApiServer, ServerConfig};
