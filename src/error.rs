//! Error types for voiceflip

use thiserror::Error;

/// Result type alias for voiceflip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in voiceflip
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Word dataset error (empty list, duplicate identity, unreadable file)
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Speech capture error
    #[error("recognition error: {0}")]
    Recognition(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
