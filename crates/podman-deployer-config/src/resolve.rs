//! Loading and resolving configuration
//!
//! Loading turns a document or the environment into a [`Config`]; resolving
//! turns a [`Config`] into a [`ResolvedConfig`] with a concrete podman binary
//! path. A failed `$PATH` lookup is an error, never an empty path.

use crate::error::{ConfigError, Result};
use crate::model::{Config, Deployment, PodmanSettings};
use crate::policy::ImagePullPolicy;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default name of the backend executable looked up on `$PATH`
pub const DEFAULT_BINARY_NAME: &str = "podman";

/// Environment variable overriding the podman binary path
pub const ENV_BINARY_PATH: &str = "PODMAN_DEPLOYER_PATH";

/// Environment variable overriding the image pull policy
pub const ENV_PULL_POLICY: &str = "PODMAN_DEPLOYER_PULL_POLICY";

impl Config {
    /// Parse a configuration from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Load configuration from environment variables.
    ///
    /// This will look for:
    /// - `PODMAN_DEPLOYER_PATH` for the podman binary path
    /// - `PODMAN_DEPLOYER_PULL_POLICY` for the image pull policy
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Apply environment variable overrides on top of this configuration
    pub fn merge_env(mut self) -> Result<Self> {
        if let Ok(path) = std::env::var(ENV_BINARY_PATH)
            && !path.trim().is_empty()
        {
            self.podman.path = Some(PathBuf::from(path));
        }

        if let Ok(policy) = std::env::var(ENV_PULL_POLICY) {
            self.deployment.image_pull_policy = policy.parse()?;
        }

        Ok(self)
    }

    /// Resolve the podman binary path, searching `$PATH` if none is configured
    pub fn resolve(self) -> Result<ResolvedConfig> {
        self.resolve_with(|name| which::which(name))
    }

    /// Resolve using a custom binary lookup
    pub fn resolve_with<F>(self, lookup: F) -> Result<ResolvedConfig>
    where
        F: FnOnce(&str) -> std::result::Result<PathBuf, which::Error>,
    {
        let binary_path = match &self.podman.path {
            Some(path) if !path.as_os_str().is_empty() => path.clone(),
            _ => {
                let found =
                    lookup(DEFAULT_BINARY_NAME).map_err(|source| ConfigError::BinaryNotFound {
                        name: DEFAULT_BINARY_NAME.to_string(),
                        source,
                    })?;
                debug!(path = %found.display(), "resolved podman binary from $PATH");
                found
            }
        };

        Ok(ResolvedConfig {
            config: self,
            binary_path,
        })
    }
}

/// A configuration whose backend binary path is known
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    config: Config,
    binary_path: PathBuf,
}

impl ResolvedConfig {
    /// Path of the podman executable
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// The image pull policy
    pub fn image_pull_policy(&self) -> ImagePullPolicy {
        self.config.deployment.image_pull_policy
    }

    /// Deployment settings
    pub fn deployment(&self) -> &Deployment {
        &self.config.deployment
    }

    /// Podman CLI settings
    pub fn podman(&self) -> &PodmanSettings {
        &self.config.podman
    }

    /// The underlying configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume and return the underlying configuration
    pub fn into_inner(self) -> Config {
        self.config
    }
}
