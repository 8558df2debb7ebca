//! Podman CLI backend
//!
//! Implements [`ContainerBackend`] by running the podman binary as a
//! subprocess for each operation.

use super::process::{display_command, run_to_completion, spawn_attached};
use crate::args::RunArgs;
use crate::error::{BackendError, Result};
use crate::traits::{ContainerBackend, ContainerIo};
use async_trait::async_trait;
use podman_deployer_config::ResolvedConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Container backend that shells out to the podman CLI
#[derive(Debug, Clone)]
pub struct PodmanCli {
    binary: PathBuf,
}

impl PodmanCli {
    /// Create a backend using the podman binary at `binary`
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Create a backend bound to the configuration's resolved binary path
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(config.binary_path())
    }

    /// Path of the podman binary
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Build the `pull` argument list
    pub fn pull_args(image: &str, architecture: Option<&str>) -> Vec<String> {
        let mut args = vec!["pull".to_string()];
        if let Some(arch) = architecture.filter(|a| !a.is_empty()) {
            args.push("--arch".to_string());
            args.push(arch.to_string());
        }
        args.push(image.to_string());
        args
    }

    /// Build the `image exists` argument list
    pub fn image_exists_args(image: &str) -> Vec<String> {
        vec!["image".to_string(), "exists".to_string(), image.to_string()]
    }
}

#[async_trait]
impl ContainerBackend for PodmanCli {
    async fn image_exists(&self, image: &str) -> Result<bool> {
        let args = Self::image_exists_args(image);
        let output = run_to_completion(&self.binary, &args).await?;

        // `podman image exists` reports absence with exit code 1
        match output.code {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            code => Err(BackendError::invocation_failed(
                display_command(&self.binary, &args),
                code,
                output.stderr,
            )),
        }
    }

    async fn pull_image(&self, image: &str, architecture: Option<&str>) -> Result<()> {
        let args = Self::pull_args(image, architecture);
        let output = run_to_completion(&self.binary, &args).await?;

        if !output.success() {
            return Err(BackendError::invocation_failed(
                display_command(&self.binary, &args),
                output.code,
                output.stderr,
            ));
        }

        debug!(image, architecture, "image pulled");
        Ok(())
    }

    async fn launch_container(&self, image: &str, config: &ResolvedConfig) -> Result<ContainerIo> {
        let args = RunArgs::from_config(image, config.config()).into_vec();
        let attached = spawn_attached(&self.binary, &args)?;

        info!(image, pid = attached.process.id(), "container launched");
        let io = ContainerIo::new(attached.stdin, attached.stdout);
        Ok(io.with_process(attached.process))
    }
}
