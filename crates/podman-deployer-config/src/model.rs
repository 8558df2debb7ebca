//! Configuration data model
//!
//! Field names follow the deployer's JSON schema: deployment-level keys are
//! camelCase, while the container, host and network sections keep the
//! Docker API's PascalCase keys so existing workflow configuration can be
//! reused unchanged.

use crate::policy::ImagePullPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level deployer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deployment configuration for the plugin
    pub deployment: Deployment,

    /// Podman CLI configuration
    pub podman: PodmanSettings,
}

/// Podman CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodmanSettings {
    /// Path of the podman executable; looked up on `$PATH` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Name of the container
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,

    /// Cgroup namespace settings (`host`, `private`, `container:<id>`, `ns:<path>`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cgroup_ns: Option<String>,
}

/// Deployment configuration for the plugin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Deployment {
    /// Container configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerConfig>,

    /// Host configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<HostConfig>,

    /// Network configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkConfig>,

    /// Platform configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformConfig>,

    /// When to pull the plugin image
    pub image_pull_policy: ImagePullPolicy,
}

/// Information about the plugin container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ContainerConfig {
    /// Hostname for the plugin container
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Domain name for the plugin container
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domainname: Option<String>,

    /// User (optionally `user:group`) that runs the command inside the container
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Environment variables in `KEY=value` form
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,

    /// Disable container networking completely
    pub network_disabled: bool,

    /// Media Access Control address for the container
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
}

/// Information about the container host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct HostConfig {
    /// Volume bindings in `source:destination[:options]` form
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub binds: Vec<String>,

    /// Network mode, container network, or named network to attach to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,

    /// Ports to expose on the host, keyed by `port/protocol`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub port_bindings: BTreeMap<String, Vec<PortBinding>>,

    /// Capabilities to add to the container
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cap_add: Vec<String>,

    /// Capabilities to drop from the container
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cap_drop: Vec<String>,

    /// Cgroup namespace mode (`private`, `host`, or empty)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cgroupns_mode: Option<String>,

    /// DNS servers to use for lookup
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<String>,

    /// DNS options
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dns_options: Vec<String>,

    /// DNS search domains
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dns_search: Vec<String>,

    /// Extra `/etc/hosts` entries in `host:ip` form
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_hosts: Vec<String>,
}

/// A single host-side binding for an exposed port
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortBinding {
    /// Host IP to bind to
    #[serde(rename = "HostIP", skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,

    /// Host port to bind to
    #[serde(rename = "HostPort", skip_serializing_if = "Option::is_none")]
    pub host_port: Option<String>,
}

/// Container networking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NetworkConfig {
    /// Networks to attach, keyed by network name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub endpoints_config: BTreeMap<String, EndpointSettings>,
}

/// Settings for one attached network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct EndpointSettings {
    /// Network-scoped aliases for the container
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// Container host platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// CPU architecture, e.g. `amd64` or `arm64`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,

    /// Operating system, e.g. `linux`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    /// CPU variant, e.g. `v8`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl Config {
    /// Create a configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the podman binary path
    pub fn with_podman_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.podman.path = Some(path.into());
        self
    }

    /// Set the container name
    pub fn with_container_name(mut self, name: impl Into<String>) -> Self {
        self.podman.container_name = Some(name.into());
        self
    }

    /// Set the image pull policy
    pub fn with_image_pull_policy(mut self, policy: ImagePullPolicy) -> Self {
        self.deployment.image_pull_policy = policy;
        self
    }

    /// Set the container configuration
    pub fn with_container(mut self, container: ContainerConfig) -> Self {
        self.deployment.container = Some(container);
        self
    }

    /// Set the host configuration
    pub fn with_host(mut self, host: HostConfig) -> Self {
        self.deployment.host = Some(host);
        self
    }

    /// Set the network configuration
    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.deployment.network = Some(network);
        self
    }

    /// Set the platform configuration
    pub fn with_platform(mut self, platform: PlatformConfig) -> Self {
        self.deployment.platform = Some(platform);
        self
    }
}
