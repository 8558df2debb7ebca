//! Container backend abstraction for the podman deployer
//!
//! Provides a capability trait for the container-management operations the
//! deployer needs, and an implementation that drives the `podman` command-line
//! tool as a subprocess.
//!
//! # Architecture
//!
//! - **ContainerBackend trait**: image presence check, image pull, and
//!   container launch with attached stdio
//! - **PodmanCli**: runs `podman image exists`, `podman pull` and
//!   `podman run --interactive` as child processes

#![deny(unsafe_code)]
#![warn(missing_docs)]
//! - **RunArgs**: pure translation of deployment configuration into
//!   `podman run` flags
//! - **Error handling**: binary-not-found, non-zero exit, and pipe failures
//!
//! # Usage
//!
//! ```ignore
//! use podman_deployer_cli::{ContainerBackend, PodmanCli};
//!
//! let backend = PodmanCli::new("/usr/bin/podman");
//! if !backend.image_exists("quay.io/arcalot/example-plugin:latest").await? {
//!     backend.pull_image("quay.io/arcalot/example-plugin:latest", Some("amd64")).await?;
//! }
//! ```

pub mod args;
pub mod error;
pub mod subprocess;
pub mod traits;

// Re-export commonly used types
pub use args::RunArgs;
pub use error::{BackendError, Result};
pub use subprocess::{CommandOutput, ContainerProcess, PodmanCli};
pub use traits::{ContainerBackend, ContainerIo, ContainerStdin, ContainerStdout};
