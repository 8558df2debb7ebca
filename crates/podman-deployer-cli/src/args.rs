//! Translation of deployment configuration into `podman run` arguments

use podman_deployer_config::{Config, PlatformConfig, PortBinding};

/// Argument vector for `podman run`
///
/// Built from configuration without touching the filesystem or spawning
/// anything, so the mapping can be inspected directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    args: Vec<String>,
}

impl RunArgs {
    /// Build the full argument list for launching `image`
    pub fn from_config(image: &str, config: &Config) -> Self {
        let mut run = Self::default();
        run.push("run");
        run.push("--interactive");
        run.push("--rm");

        if let Some(name) = non_empty(&config.podman.container_name) {
            run.flag("--name", name);
        }

        let deployment = &config.deployment;
        let host = deployment.host.as_ref();

        let cgroupns = non_empty(&config.podman.cgroup_ns)
            .or_else(|| host.and_then(|h| non_empty(&h.cgroupns_mode)));
        if let Some(mode) = cgroupns {
            run.flag("--cgroupns", mode);
        }

        let mut network_disabled = false;
        if let Some(container) = &deployment.container {
            if let Some(hostname) = non_empty(&container.hostname) {
                run.flag("--hostname", hostname);
            }
            if let Some(domain) = non_empty(&container.domainname) {
                run.flag("--domainname", domain);
            }
            if let Some(user) = non_empty(&container.user) {
                run.flag("--user", user);
            }
            for env in &container.env {
                run.flag("--env", env);
            }
            if let Some(mac) = non_empty(&container.mac_address) {
                run.flag("--mac-address", mac);
            }
            network_disabled = container.network_disabled;
        }

        if network_disabled {
            run.flag("--network", "none");
        }

        if let Some(host) = host {
            for bind in &host.binds {
                run.flag("--volume", bind);
            }
            if !network_disabled && let Some(mode) = non_empty(&host.network_mode) {
                run.flag("--network", mode);
            }
            for (port, bindings) in &host.port_bindings {
                if bindings.is_empty() {
                    run.flag("--publish", port);
                }
                for binding in bindings {
                    run.flag("--publish", &publish_spec(port, binding));
                }
            }
            for cap in &host.cap_add {
                run.flag("--cap-add", cap);
            }
            for cap in &host.cap_drop {
                run.flag("--cap-drop", cap);
            }
            for server in &host.dns {
                run.flag("--dns", server);
            }
            for option in &host.dns_options {
                run.flag("--dns-option", option);
            }
            for domain in &host.dns_search {
                run.flag("--dns-search", domain);
            }
            for entry in &host.extra_hosts {
                run.flag("--add-host", entry);
            }
        }

        let has_network_mode = host.and_then(|h| non_empty(&h.network_mode)).is_some();
        if !network_disabled
            && !has_network_mode
            && let Some(network) = &deployment.network
        {
            for (name, endpoint) in &network.endpoints_config {
                run.flag("--network", name);
                for alias in &endpoint.aliases {
                    run.flag("--network-alias", alias);
                }
            }
        }

        if let Some(platform) = deployment.platform.as_ref().and_then(platform_spec) {
            run.flag("--platform", &platform);
        }

        run.push(image);
        run
    }

    /// The arguments, excluding the binary itself
    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    /// Consume into the argument vector
    pub fn into_vec(self) -> Vec<String> {
        self.args
    }

    fn push(&mut self, arg: &str) {
        self.args.push(arg.to_string());
    }

    fn flag(&mut self, name: &str, value: &str) {
        self.push(name);
        self.push(value);
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn publish_spec(port: &str, binding: &PortBinding) -> String {
    let host_port = non_empty(&binding.host_port);
    match (non_empty(&binding.host_ip), host_port) {
        (Some(ip), Some(hp)) => format!("{ip}:{hp}:{port}"),
        (Some(ip), None) => format!("{ip}::{port}"),
        (None, Some(hp)) => format!("{hp}:{port}"),
        (None, None) => port.to_string(),
    }
}

fn platform_spec(platform: &PlatformConfig) -> Option<String> {
    let arch = non_empty(&platform.architecture)?;
    let os = non_empty(&platform.os).unwrap_or("linux");
    Some(match non_empty(&platform.variant) {
        Some(variant) => format!("{os}/{arch}/{variant}"),
        None => format!("{os}/{arch}"),
    })
}
