//! Error types for the core layer.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Engine call failed.
    #[error("engine error: {0}")]
    Engine(String),

    /// Container or record not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Document encode/decode error.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The engine event feed closed. Without it no supervision guarantee
    /// can be given, so this is fatal to the process.
    #[error("engine event feed closed")]
    EventFeedClosed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
