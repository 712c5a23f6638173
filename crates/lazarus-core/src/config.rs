//! Daemon configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Default engine endpoint.
pub const DEFAULT_ENGINE_ENDPOINT: &str = "unix:///var/run/docker.sock";

/// Default persistence directory, relative to the working directory.
pub const DEFAULT_STATE_DIR: &str = "containers";

/// Lazarus configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Container engine endpoint (`unix://...` or `tcp://host:port`).
    pub engine_endpoint: String,
    /// Root directory for persisted configurations. `None`, or a directory
    /// that does not exist at startup, selects memory-only mode.
    pub state_dir: Option<PathBuf>,
    /// Listen address for the registration API.
    pub listen_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine_endpoint: DEFAULT_ENGINE_ENDPOINT.to_string(),
            state_dir: Some(PathBuf::from(DEFAULT_STATE_DIR)),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}
