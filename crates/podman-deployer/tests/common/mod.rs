//! Shared helpers for deployer integration tests

#![allow(dead_code)]

use podman_deployer::testing::{FakeBackend, FakeConfig};
use podman_deployer::{Config, ImagePullPolicy, PodmanConnector, PodmanConnectorFactory};
use std::path::PathBuf;
use std::sync::Arc;

pub const IMAGE: &str = "example.com/img:tag";

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Connector over a fake backend with the given pull policy
pub fn fake_connector(
    policy: ImagePullPolicy,
    fake_config: FakeConfig,
) -> (PodmanConnector, FakeBackend) {
    init_tracing();
    let fake = FakeBackend::with_config(fake_config);
    let config = Config::new()
        .with_podman_path("/usr/bin/podman")
        .with_image_pull_policy(policy)
        .resolve()
        .expect("explicit path always resolves");
    let connector =
        PodmanConnectorFactory::new().create_with_backend(config, Arc::new(fake.clone()));
    (connector, fake)
}

/// Write an executable shell script standing in for podman
#[cfg(unix)]
pub fn write_fake_podman(dir: &std::path::Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let binary = dir.join("podman");
    std::fs::write(&binary, format!("#!/bin/sh\n{body}\n")).expect("write fake podman");
    std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))
        .expect("make fake podman executable");
    binary
}
