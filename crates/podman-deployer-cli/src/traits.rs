//! Container backend trait
//!
//! Defines the capability set the deployer needs from a container backend.
//! The podman CLI is one implementation; tests and alternative runtimes can
//! provide others without touching the connector.

use crate::error::Result;
use crate::subprocess::ContainerProcess;
use async_trait::async_trait;
use podman_deployer_config::ResolvedConfig;
use tokio::io::{AsyncRead, AsyncWrite};

/// Writable end connected to the container's standard input
pub type ContainerStdin = Box<dyn AsyncWrite + Send + Unpin>;

/// Readable end connected to the container's standard output
pub type ContainerStdout = Box<dyn AsyncRead + Send + Unpin>;

/// Stdio endpoints of a launched container
///
/// Both halves are independently closable: dropping (or shutting down) the
/// writer signals EOF to the container without affecting the reader.
pub struct ContainerIo {
    /// Container standard input
    pub stdin: ContainerStdin,

    /// Container standard output
    pub stdout: ContainerStdout,

    /// Backing process, when the container runs as a local subprocess
    pub process: Option<ContainerProcess>,
}

impl ContainerIo {
    /// Bundle a writer and a reader
    pub fn new(
        stdin: impl AsyncWrite + Send + Unpin + 'static,
        stdout: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            process: None,
        }
    }

    /// Attach the process that owns the pipes
    pub fn with_process(mut self, process: ContainerProcess) -> Self {
        self.process = Some(process);
        self
    }
}

impl std::fmt::Debug for ContainerIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerIo")
            .field("process", &self.process)
            .finish_non_exhaustive()
    }
}

/// Container-management operations used by the deployer
///
/// Every operation blocks the calling task until the backend finishes. None
/// of them retry. Dropping an in-flight future must not leak the backend
/// process.
#[async_trait]
pub trait ContainerBackend: Send + Sync {
    /// Check whether the image is present in local storage
    ///
    /// `Ok(false)` means the check ran and the image is absent; an invocation
    /// failure is an `Err`.
    async fn image_exists(&self, image: &str) -> Result<bool>;

    /// Pull the image, optionally for a specific CPU architecture
    async fn pull_image(&self, image: &str, architecture: Option<&str>) -> Result<()>;

    /// Start a container from the image and attach to its stdin and stdout
    async fn launch_container(&self, image: &str, config: &ResolvedConfig) -> Result<ContainerIo>;
}
