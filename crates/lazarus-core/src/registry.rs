//! Configuration registry.
//!
//! The single source of truth for which containers are supervised and with
//! what launch configuration. Memory is authoritative for the running
//! process; disk is a recovery aid.

use crate::error::Result;
use crate::persist::Persister;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory mapping from container name to launch configuration, backed
/// by a [`Persister`].
///
/// Mutations and [`snapshot`](Self::snapshot) take the write lock and are
/// mutually exclusive; [`get`](Self::get) runs concurrently under the read
/// lock. Persistence side-effects happen inside the write-lock critical
/// section, so the backend never sees overlapping writes for one name.
pub struct ConfigStore {
    entries: RwLock<HashMap<String, Value>>,
    persister: Box<dyn Persister>,
}

impl ConfigStore {
    /// Creates an empty store over the given persistence backend.
    #[must_use]
    pub fn new(persister: Box<dyn Persister>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            persister,
        }
    }

    /// Populates the store from the persistence backend. Invoked once,
    /// right after construction.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend itself is unreachable. Individual
    /// records that failed to decode were already skipped by the backend.
    pub fn load(&self) -> Result<()> {
        let records = self.persister.load_all()?;
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        for (name, document) in records {
            tracing::info!(name, "restored supervised container");
            entries.insert(name, document);
        }
        Ok(())
    }

    /// Upserts a launch configuration, then best-effort persists it.
    ///
    /// A persistence failure is logged and neither undoes the in-memory
    /// write nor fails the call. The write lock is held across the save so
    /// the backend never sees overlapping writes for one name.
    pub fn add(&self, name: &str, document: Value) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(name.to_string(), document.clone());

        if let Err(e) = self.persister.save(name, &document) {
            tracing::warn!(name, error = %e, "failed to persist configuration; it will not survive a restart");
        }
    }

    /// Looks up the launch configuration for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Removes `name` from supervision, best-effort deleting its durable
    /// record. Idempotent.
    ///
    /// Any currently running instance keeps running; it is simply no longer
    /// recreated the next time it dies.
    pub fn remove(&self, name: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(name);

        if let Err(e) = self.persister.delete(name) {
            tracing::warn!(name, error = %e, "failed to delete persisted configuration");
        }
    }

    /// Returns a point-in-time copy of the full mapping. Never aliases the
    /// live map, so callers may iterate while mutations proceed.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
