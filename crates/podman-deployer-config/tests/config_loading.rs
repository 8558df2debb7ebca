//! Loading configuration from files and the environment

use podman_deployer_config::{
    Config, ConfigError, ENV_BINARY_PATH, ENV_PULL_POLICY, ImagePullPolicy,
};
use std::io::Write;
use std::path::{Path, PathBuf};

#[test]
fn test_load_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"deployment": {{"imagePullPolicy": "Always"}}, "podman": {{"path": "/opt/bin/podman"}}}}"#
    )
    .unwrap();

    let config = Config::from_json_file(file.path()).unwrap();
    assert_eq!(config.deployment.image_pull_policy, ImagePullPolicy::Always);

    let resolved = config.resolve().unwrap();
    assert_eq!(resolved.binary_path(), Path::new("/opt/bin/podman"));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_json_file(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_malformed_json_is_parse_error() {
    let err = Config::from_json_str("{\"deployment\": ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_unknown_pull_policy_rejected() {
    let err = Config::from_json_str(r#"{"deployment": {"imagePullPolicy": "Sometimes"}}"#)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_empty_document_uses_defaults() {
    let config = Config::from_json_str("{}").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_from_env_overrides() {
    temp_env::with_vars(
        [
            (ENV_BINARY_PATH, Some("/custom/podman")),
            (ENV_PULL_POLICY, Some("never")),
        ],
        || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.podman.path, Some(PathBuf::from("/custom/podman")));
            assert_eq!(config.deployment.image_pull_policy, ImagePullPolicy::Never);
        },
    );
}

#[test]
fn test_from_env_without_vars_keeps_defaults() {
    temp_env::with_vars_unset([ENV_BINARY_PATH, ENV_PULL_POLICY], || {
        let config = Config::from_env().unwrap();
        assert_eq!(config, Config::default());
    });
}

#[test]
fn test_from_env_invalid_policy() {
    temp_env::with_var(ENV_PULL_POLICY, Some("eventually"), || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPullPolicy(ref v) if v == "eventually"));
    });
}

#[test]
fn test_merge_env_keeps_file_values() {
    temp_env::with_vars(
        [(ENV_BINARY_PATH, None::<&str>), (ENV_PULL_POLICY, Some("Always"))],
        || {
            let config = Config::new()
                .with_podman_path("/from/file")
                .merge_env()
                .unwrap();
            assert_eq!(config.podman.path, Some(PathBuf::from("/from/file")));
            assert_eq!(config.deployment.image_pull_policy, ImagePullPolicy::Always);
        },
    );
}
