//! Configuration error types

use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading or resolving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The backend binary could not be located on the search path
    #[error("{name} binary not found in $PATH, please provide it in configuration: {source}")]
    BinaryNotFound {
        /// Binary name that was looked up
        name: String,
        /// Underlying lookup failure
        #[source]
        source: which::Error,
    },

    /// Unknown image pull policy value
    #[error(
        "Invalid image pull policy: '{0}'. Expected one of: Always, IfNotPresent, Never"
    )]
    InvalidPullPolicy(String),

    /// Configuration document could not be parsed
    #[error("Configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
