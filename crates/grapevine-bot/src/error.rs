//! Error types for the bot.

use crate::platform::PlatformError;
use thiserror::Error;

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the bot.
#[derive(Debug, Error)]
pub enum Error {
    /// A required environment variable is unset or empty
    #[error("expecting to have {0} environment variable set but got nothing")]
    MissingVar(&'static str),

    /// An environment variable could not be parsed
    #[error("invalid {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },

    /// Settings that cannot be used as given
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chat platform call failed
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Graph log error
    #[error("Graph log error: {0}")]
    Graph(#[from] grapevine_graph::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
