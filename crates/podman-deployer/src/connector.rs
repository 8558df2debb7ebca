//! Deployment connector
//!
//! Turns an image reference into a running plugin: applies the image pull
//! policy, launches the container through the backend, and wraps its stdio
//! in a [`PodmanPlugin`]. Steps run sequentially and fail fast.

use crate::error::{DeployError, Result};
use crate::plugin::{DEFAULT_STOP_TIMEOUT, Plugin, PodmanPlugin};
use async_trait::async_trait;
use podman_deployer_cli::ContainerBackend;
use podman_deployer_config::{ImagePullPolicy, ResolvedConfig};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Architecture requested when pulling images
pub const DEFAULT_PULL_ARCHITECTURE: &str = "amd64";

/// Something that can deploy plugins from images
#[async_trait]
pub trait Connector: Send + Sync {
    /// Deploy `image` and return a handle to the running plugin
    ///
    /// Cancelling `ctx` aborts the step in progress; no handle is returned
    /// and no backend process is left running.
    async fn deploy(&self, ctx: &CancellationToken, image: &str) -> Result<Box<dyn Plugin>>;
}

/// Connector that runs plugins through a [`ContainerBackend`]
#[derive(Clone)]
pub struct PodmanConnector {
    config: Arc<ResolvedConfig>,
    backend: Arc<dyn ContainerBackend>,
    stop_timeout: Duration,
}

impl PodmanConnector {
    /// Create a connector from a resolved configuration and a backend
    pub fn new(config: ResolvedConfig, backend: Arc<dyn ContainerBackend>) -> Self {
        Self {
            config: Arc::new(config),
            backend,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    /// Set how long closing a deployed plugin waits for its container
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// The configuration every deployment uses
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Deploy `image`, returning the concrete plugin type
    #[tracing::instrument(skip(self, ctx), fields(policy = %self.config.image_pull_policy()))]
    pub async fn deploy_plugin(
        &self,
        ctx: &CancellationToken,
        image: &str,
    ) -> Result<PodmanPlugin> {
        validate_image(image)?;

        self.pull_image(ctx, image).await?;

        let io = cancellable(ctx, self.backend.launch_container(image, &self.config)).await?;
        info!(image, "plugin container started");

        let plugin = PodmanPlugin::new(
            Arc::clone(&self.backend),
            image,
            Arc::clone(&self.config),
            io,
        );
        Ok(plugin.with_stop_timeout(self.stop_timeout))
    }

    async fn pull_image(&self, ctx: &CancellationToken, image: &str) -> Result<()> {
        match self.config.image_pull_policy() {
            ImagePullPolicy::Never => Ok(()),
            ImagePullPolicy::IfNotPresent => {
                let exists = cancellable(ctx, self.backend.image_exists(image)).await?;
                if exists {
                    debug!(image, "image already present, skipping pull");
                    return Ok(());
                }
                self.pull(ctx, image).await
            }
            ImagePullPolicy::Always => self.pull(ctx, image).await,
        }
    }

    async fn pull(&self, ctx: &CancellationToken, image: &str) -> Result<()> {
        debug!(image, architecture = DEFAULT_PULL_ARCHITECTURE, "pulling image");
        cancellable(
            ctx,
            self.backend.pull_image(image, Some(DEFAULT_PULL_ARCHITECTURE)),
        )
        .await
    }
}

#[async_trait]
impl Connector for PodmanConnector {
    async fn deploy(&self, ctx: &CancellationToken, image: &str) -> Result<Box<dyn Plugin>> {
        let plugin = self.deploy_plugin(ctx, image).await?;
        Ok(Box::new(plugin))
    }
}

impl std::fmt::Debug for PodmanConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PodmanConnector")
            .field("config", &self.config)
            .field("stop_timeout", &self.stop_timeout)
            .finish_non_exhaustive()
    }
}

/// Reject references podman would misread as a flag, or could not pull
fn validate_image(image: &str) -> Result<()> {
    if image.trim().is_empty() {
        return Err(DeployError::InvalidImage {
            image: image.to_string(),
            reason: "image must not be empty",
        });
    }
    if image.starts_with('-') {
        return Err(DeployError::InvalidImage {
            image: image.to_string(),
            reason: "image must not start with '-'",
        });
    }
    Ok(())
}

/// Race a backend step against cancellation
///
/// Losing the race drops the backend future, which kills any subprocess it
/// spawned.
async fn cancellable<T, F>(ctx: &CancellationToken, step: F) -> Result<T>
where
    F: Future<Output = podman_deployer_cli::Result<T>>,
{
    tokio::select! {
        biased;
        () = ctx.cancelled() => Err(DeployError::Cancelled),
        result = step => result.map_err(DeployError::from),
    }
}
