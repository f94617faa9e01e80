//! Error types for fleet access and configuration

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No explicit path and no config directory could be determined
    #[error("could not determine configuration path")]
    NoConfigPath,

    /// Failed to read the configuration file
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration is not valid JSON for the expected shape
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// An `env:` token reference names an unset variable
    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    /// Configuration parsed but is unusable
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur while talking to the fleet API
#[derive(Debug, Error)]
pub enum FleetError {
    /// Transport or body decoding failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error while writing reports
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialisation failed
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
