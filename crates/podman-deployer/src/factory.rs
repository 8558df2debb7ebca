//! Connector factory

use crate::connector::PodmanConnector;
use crate::error::Result;
use podman_deployer_cli::{ContainerBackend, PodmanCli};
use podman_deployer_config::{Config, ResolvedConfig};
use std::sync::Arc;

/// Builds [`PodmanConnector`]s from configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct PodmanConnectorFactory;

impl PodmanConnectorFactory {
    /// Identifier of this deployer
    pub const ID: &'static str = "podman";

    /// Create a factory
    pub fn new() -> Self {
        Self
    }

    /// Identifier of this deployer
    pub fn id(&self) -> &'static str {
        Self::ID
    }

    /// Resolve `config` and build a connector backed by the podman CLI
    ///
    /// Fails if no podman path is configured and none can be found on
    /// `$PATH`.
    pub fn create(&self, config: Config) -> Result<PodmanConnector> {
        let resolved = config.resolve()?;
        let backend = Arc::new(PodmanCli::from_config(&resolved));
        Ok(PodmanConnector::new(resolved, backend))
    }

    /// Build a connector around an already-resolved configuration and a
    /// custom backend
    pub fn create_with_backend(
        &self,
        config: ResolvedConfig,
        backend: Arc<dyn ContainerBackend>,
    ) -> PodmanConnector {
        PodmanConnector::new(config, backend)
    }
}
