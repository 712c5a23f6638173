//! Container engine abstraction.
//!
//! The supervisor and the registration API talk to the engine through the
//! [`Engine`] trait, allowing different implementations (real Docker API
//! client, mock for testing).

use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

/// Event status tag indicating a container has stopped running.
pub const DEATH_STATUS: &str = "die";

/// A lifecycle event from the engine's feed.
///
/// Only `id` and `status` are meaningful here; everything else the engine
/// attaches to an event is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineEvent {
    /// Container instance ID.
    #[serde(default)]
    pub id: String,
    /// Event status tag (`die`, `start`, `create`, ...).
    #[serde(default)]
    pub status: String,
}

impl EngineEvent {
    /// Returns whether this event reports a container death.
    #[must_use]
    pub fn is_death(&self) -> bool {
        self.status == DEATH_STATUS
    }
}

/// Details of a container instance, as reported by inspect.
#[derive(Debug, Clone)]
pub struct ContainerDetails {
    /// Container instance ID.
    pub id: String,
    /// Container name as the engine reports it (may carry a leading `/`).
    pub name: String,
    /// The container's own launch configuration (image, command, env).
    /// Opaque to the core.
    pub config: Value,
    /// Runtime host configuration the instance was started with.
    pub host_config: Value,
}

/// A freshly created container instance.
#[derive(Debug, Clone)]
pub struct CreatedContainer {
    /// Container instance ID.
    pub id: String,
}

/// Container engine operations the core depends on.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Inspects a container by ID or name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::NotFound`] if the instance no longer
    /// exists, or an engine error.
    async fn inspect(&self, id: &str) -> Result<ContainerDetails>;

    /// Removes a container instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine refuses the removal.
    async fn remove(&self, id: &str) -> Result<()>;

    /// Creates a new container under `name` from a launch configuration
    /// document.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot create the container.
    async fn create(&self, name: &str, document: &Value) -> Result<CreatedContainer>;

    /// Starts a container instance with the given host configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot start the container.
    async fn start(&self, id: &str, host_config: &Value) -> Result<()>;

    /// Subscribes to the engine's lifecycle event feed.
    ///
    /// The channel closes when the feed ends; the subscriber decides whether
    /// that is fatal.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be established.
    async fn subscribe(&self) -> Result<mpsc::Receiver<EngineEvent>>;
}
