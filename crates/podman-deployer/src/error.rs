//! Error types for deployments

use podman_deployer_cli::BackendError;
use podman_deployer_config::ConfigError;
use thiserror::Error;

/// Result type for deployer operations
pub type Result<T> = std::result::Result<T, DeployError>;

/// Errors that can occur while deploying a plugin
///
/// Every variant is terminal for the `deploy` call that produced it; no
/// step is retried and no handle is returned.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The image reference was rejected before reaching the backend
    #[error("Invalid image reference {image:?}: {reason}")]
    InvalidImage {
        /// The rejected reference
        image: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Configuration could not be resolved
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The container backend failed (presence check, pull, or launch)
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The deployment was cancelled by the caller
    #[error("Deployment cancelled")]
    Cancelled,
}

impl DeployError {
    /// Whether this error came from cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
