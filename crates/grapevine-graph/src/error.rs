//! Error types for the graph log.

use thiserror::Error;

/// Result type for graph log operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while writing or reading the graph log.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A complete line in the log could not be decoded.
    #[error("malformed edge on line {line}: {reason}")]
    Corrupt { line: usize, reason: String },
}
