//! Death-triggered recreation loop.
//!
//! One task drains the engine's lifecycle feed in arrival order. For every
//! death of a supervised container it removes the dead instance, recreates
//! it under the same name from the stored launch configuration, and starts
//! the replacement with the host configuration captured from the dying
//! instance.

use crate::engine::{Engine, EngineEvent};
use crate::error::{CoreError, Result};
use crate::registry::ConfigStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Recreation supervisor.
///
/// Reads the registry, never mutates it. Events are handled strictly one
/// at a time; a failure on one event is logged and the loop moves on. Only
/// losing the feed itself is fatal.
pub struct Supervisor {
    engine: Arc<dyn Engine>,
    store: Arc<ConfigStore>,
}

impl Supervisor {
    /// Creates a supervisor over the given engine and registry.
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, store: Arc<ConfigStore>) -> Self {
        Self { engine, store }
    }

    /// Runs the supervision loop until cancelled or the feed is lost.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed cannot be subscribed, or
    /// [`CoreError::EventFeedClosed`] if it ends. Both leave the process
    /// without any supervision guarantee and must terminate it.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let mut events = self.engine.subscribe().await?;
        tracing::info!("supervising container deaths");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!("supervisor stopped");
                    return Ok(());
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => return Err(CoreError::EventFeedClosed),
                },
            }
        }
    }

    async fn handle_event(&self, event: EngineEvent) {
        if !event.is_death() {
            return;
        }

        // The instance can vanish between the event and the inspect.
        let details = match self.engine.inspect(&event.id).await {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!(id = %event.id, error = %e, "container destroyed too quickly, skipping");
                return;
            }
        };

        let name = details.name.trim_start_matches('/');
        let Some(document) = self.store.get(name) else {
            tracing::debug!(name, id = %details.id, "container not supervised, leaving it dead");
            return;
        };

        tracing::info!(name, id = %details.id, "supervised container died, recreating");

        if let Err(e) = self.engine.remove(&details.id).await {
            tracing::warn!(name, id = %details.id, error = %e, "unable to remove dead container");
        }

        let created = match self.engine.create(name, &document).await {
            Ok(created) => created,
            Err(e) => {
                // The name now has no live instance until something
                // re-registers or recreates it externally.
                tracing::warn!(name, error = %e, "unable to recreate container");
                return;
            }
        };

        // Host configuration comes from the instance as it last ran, so
        // out-of-band runtime changes survive the restart.
        if let Err(e) = self.engine.start(&created.id, &details.host_config).await {
            tracing::warn!(name, id = %created.id, error = %e, "unable to start recreated container");
            return;
        }

        tracing::info!(name, id = %created.id, "container restarted");
    }
}
