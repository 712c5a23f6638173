//! # lazarus-core
//!
//! Core supervision layer for Lazarus.
//!
//! This crate keeps named containers alive across their deaths:
//!
//! - [`ConfigStore`]: registry of supervised names and their launch
//!   configurations, optionally backed by a directory on disk
//! - [`Supervisor`]: consumer of the engine lifecycle feed that recreates
//!   and restarts a supervised container whenever it dies
//! - [`DockerClient`]: Docker Engine API client used for inspect, remove,
//!   create, start and the event feed
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  lazarus-core                   │
//! │  ┌─────────────┐  ┌────────────┐  ┌──────────┐ │
//! │  │ ConfigStore │◄─┤ Supervisor │  │  Engine  │ │
//! │  │             │  │            ├─►│  client  │ │
//! │  └──────┬──────┘  └─────▲──────┘  └────┬─────┘ │
//! │         │               │ die          │       │
//! │         ▼               └──────────────┘       │
//! │  ┌─────────────┐          event feed           │
//! │  │  Persister  │                               │
//! │  └─────────────┘                               │
//! └─────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod docker;
pub mod engine;
pub mod error;
pub mod persist;
pub mod registry;
pub mod supervisor;

pub use config::Config;
pub use docker::DockerClient;
pub use engine::{ContainerDetails, CreatedContainer, Engine, EngineEvent};
pub use error::{CoreError, Result};
pub use persist::{DirPersister, NullPersister, Persister};
pub use registry::ConfigStore;
pub use supervisor::Supervisor;
