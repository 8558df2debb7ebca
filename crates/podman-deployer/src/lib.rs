//! Podman deployer
//!
//! Deploys a plugin image as a podman container and exposes the container's
//! stdin/stdout as a single duplex byte stream.
//!
//! # Key Features
//!
//! - **Pull policies**: `Always`, `IfNotPresent` and `Never`
//! - **CLI backend**: drives the `podman` binary; no daemon API required
//! - **Pluggable backends**: anything implementing `ContainerBackend`
//! - **Safe teardown**: `close` releases the container's pipes exactly once
//!
//! # Architecture
//!
//! 1. **Configuration** (`podman-deployer-config`): data model and binary
//!    path resolution
//! 2. **Backend** (`podman-deployer-cli`): container operations over the CLI
//! 3. **Deployer** (this crate): connector, factory, and plugin handle
//!
//! # Usage Example
//!
//! ```ignore
//! use podman_deployer::{Connector, Plugin, PodmanConnectorFactory};
//! use podman_deployer_config::Config;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let connector = PodmanConnectorFactory::new().create(Config::from_env()?)?;
//!     let plugin = connector
//!         .deploy(&CancellationToken::new(), "quay.io/arcalot/example-plugin:latest")
//!         .await?;
//!
//!     plugin.write(b"hello\n").await?;
//!     let mut buf = [0u8; 1024];
//!     let n = plugin.read(&mut buf).await?;
//!     println!("{}", String::from_utf8_lossy(&buf[..n]));
//!
//!     plugin.close().await?;
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod connector;
pub mod error;
pub mod factory;
pub mod plugin;

pub mod testing;

// Re-export commonly used types
pub use connector::{Connector, DEFAULT_PULL_ARCHITECTURE, PodmanConnector};
pub use error::{DeployError, Result};
pub use factory::PodmanConnectorFactory;
pub use plugin::{DEFAULT_STOP_TIMEOUT, Plugin, PodmanPlugin};

pub use podman_deployer_cli::{
    BackendError, ContainerBackend, ContainerIo, ContainerProcess, PodmanCli,
};
pub use podman_deployer_config::{Config, ImagePullPolicy, ResolvedConfig};
pub use tokio_util::sync::CancellationToken;
