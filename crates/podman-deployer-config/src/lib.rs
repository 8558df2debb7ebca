//! Configuration for the podman deployer
//!
//! Describes how a plugin container is deployed: the podman binary to use,
//! container naming, the Docker-style container/host/network/platform
//! settings, and the image pull policy.
//!
//! # Resolution
//!
//! A [`Config`] is loaded from JSON or built in code, and must be turned into
//! a [`ResolvedConfig`] before a connector can use it. Resolution locates the
//! podman binary on `$PATH` when no explicit path is configured and fails
//! loudly when it cannot be found.
//!
//! ```ignore
//! use podman_deployer_config::{Config, ImagePullPolicy};
//!
//! let config = Config::from_json_str(r#"{"deployment": {"imagePullPolicy": "Never"}}"#)?;
//! let resolved = config.resolve()?;
//! assert_eq!(resolved.image_pull_policy(), ImagePullPolicy::Never);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod model;
pub mod policy;
pub mod resolve;

// Re-export commonly used types
pub use error::{ConfigError, Result};
pub use model::{
    Config, ContainerConfig, Deployment, EndpointSettings, HostConfig, NetworkConfig,
    PlatformConfig, PodmanSettings, PortBinding,
};
pub use policy::ImagePullPolicy;
pub use resolve::{DEFAULT_BINARY_NAME, ENV_BINARY_PATH, ENV_PULL_POLICY, ResolvedConfig};
