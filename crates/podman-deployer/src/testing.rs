//! Testing utilities
//!
//! Provides an in-memory container backend so connectors and plugin handles
//! can be exercised without a podman binary.

use async_trait::async_trait;
use podman_deployer_cli::{BackendError, ContainerBackend, ContainerIo};
use podman_deployer_config::ResolvedConfig;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};
use tokio::sync::Mutex;

const PIPE_CAPACITY: usize = 64 * 1024;

/// Scripted behaviour for [`FakeBackend`]
#[derive(Debug, Clone)]
pub struct FakeConfig {
    /// Result of `image_exists` when no error is configured
    pub image_present: bool,

    /// If set, `image_exists` fails with this stderr
    pub image_exists_error: Option<String>,

    /// If set, `pull_image` fails with this stderr
    pub pull_error: Option<String>,

    /// If set, `launch_container` fails with this stderr
    pub launch_error: Option<String>,

    /// Delay applied before every operation
    pub delay: Option<Duration>,
}

impl Default for FakeConfig {
    fn default() -> Self {
        Self {
            image_present: true,
            image_exists_error: None,
            pull_error: None,
            launch_error: None,
            delay: None,
        }
    }
}

/// A recorded `pull_image` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullCall {
    /// Image reference
    pub image: String,
    /// Requested architecture
    pub architecture: Option<String>,
}

/// Container side of a fake launch
#[derive(Debug)]
pub struct FakeContainer {
    /// Receives what the plugin writes
    pub stdin: DuplexStream,
    /// Feeds what the plugin reads
    pub stdout: DuplexStream,
}

/// Counters for pipe ends handed out by [`FakeBackend`]
#[derive(Debug, Clone, Default)]
pub struct PipeStats {
    created: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    shutdowns: Arc<AtomicUsize>,
}

impl PipeStats {
    /// Pipe ends handed to plugins
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Pipe ends dropped
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Write ends shut down
    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    /// Pipe ends still alive
    pub fn live(&self) -> usize {
        self.created() - self.released()
    }
}

/// Pipe end that reports its shutdown and release to [`PipeStats`]
#[derive(Debug)]
pub struct TrackedPipe {
    inner: DuplexStream,
    stats: PipeStats,
}

impl TrackedPipe {
    fn new(inner: DuplexStream, stats: &PipeStats) -> Self {
        stats.created.fetch_add(1, Ordering::SeqCst);
        Self {
            inner,
            stats: stats.clone(),
        }
    }
}

impl Drop for TrackedPipe {
    fn drop(&mut self) {
        self.stats.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl AsyncRead for TrackedPipe {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for TrackedPipe {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<std::io::Result<()>> {
        let poll = Pin::new(&mut self.inner).poll_shutdown(cx);
        if poll.is_ready() {
            self.stats.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
        poll
    }
}

#[derive(Debug, Default)]
struct Calls {
    image_exists: Vec<String>,
    pulls: Vec<PullCall>,
    launches: Vec<String>,
}

/// In-memory container backend
///
/// Allows tests to:
/// - Script image presence and failures per operation
/// - Count and inspect every backend call
/// - Drive the container side of launched plugins
/// - Assert that pipe ends are released
#[derive(Clone, Default)]
pub struct FakeBackend {
    config: FakeConfig,
    calls: Arc<Mutex<Calls>>,
    containers: Arc<Mutex<Vec<FakeContainer>>>,
    stats: PipeStats,
}

impl FakeBackend {
    /// Create a fake backend where every image is present
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fake backend with scripted behaviour
    pub fn with_config(config: FakeConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Images passed to `image_exists`
    pub async fn image_exists_calls(&self) -> Vec<String> {
        self.calls.lock().await.image_exists.clone()
    }

    /// Calls made to `pull_image`
    pub async fn pull_calls(&self) -> Vec<PullCall> {
        self.calls.lock().await.pulls.clone()
    }

    /// Images passed to `launch_container`
    pub async fn launch_calls(&self) -> Vec<String> {
        self.calls.lock().await.launches.clone()
    }

    /// Take the container side of the oldest launch not yet taken
    pub async fn take_container(&self) -> Option<FakeContainer> {
        let mut containers = self.containers.lock().await;
        if containers.is_empty() {
            None
        } else {
            Some(containers.remove(0))
        }
    }

    /// Make the oldest untaken container echo its stdin back to stdout
    pub async fn spawn_echo(&self) {
        if let Some(FakeContainer {
            mut stdin,
            mut stdout,
        }) = self.take_container().await
        {
            tokio::spawn(async move {
                let _ = tokio::io::copy(&mut stdin, &mut stdout).await;
            });
        }
    }

    /// Pipe counters shared by every launch of this backend
    pub fn pipe_stats(&self) -> PipeStats {
        self.stats.clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.config.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn scripted_failure(command: &str, stderr: &str) -> BackendError {
    BackendError::invocation_failed(command, Some(125), stderr)
}

#[async_trait]
impl ContainerBackend for FakeBackend {
    async fn image_exists(&self, image: &str) -> podman_deployer_cli::Result<bool> {
        self.calls.lock().await.image_exists.push(image.to_string());
        self.pause().await;

        if let Some(stderr) = &self.config.image_exists_error {
            return Err(scripted_failure("podman image exists", stderr));
        }
        Ok(self.config.image_present)
    }

    async fn pull_image(
        &self,
        image: &str,
        architecture: Option<&str>,
    ) -> podman_deployer_cli::Result<()> {
        self.calls.lock().await.pulls.push(PullCall {
            image: image.to_string(),
            architecture: architecture.map(str::to_string),
        });
        self.pause().await;

        if let Some(stderr) = &self.config.pull_error {
            return Err(scripted_failure("podman pull", stderr));
        }
        Ok(())
    }

    async fn launch_container(
        &self,
        image: &str,
        _config: &ResolvedConfig,
    ) -> podman_deployer_cli::Result<ContainerIo> {
        self.calls.lock().await.launches.push(image.to_string());
        self.pause().await;

        if let Some(stderr) = &self.config.launch_error {
            return Err(scripted_failure("podman run", stderr));
        }

        let (plugin_stdin, container_stdin) = tokio::io::duplex(PIPE_CAPACITY);
        let (container_stdout, plugin_stdout) = tokio::io::duplex(PIPE_CAPACITY);

        self.containers.lock().await.push(FakeContainer {
            stdin: container_stdin,
            stdout: container_stdout,
        });

        Ok(ContainerIo::new(
            TrackedPipe::new(plugin_stdin, &self.stats),
            TrackedPipe::new(plugin_stdout, &self.stats),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podman_deployer_config::Config;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn resolved() -> ResolvedConfig {
        Config::new().with_podman_path("/bin/podman").resolve().unwrap()
    }

    #[tokio::test]
    async fn test_fake_records_calls() {
        let fake = FakeBackend::new();
        assert!(fake.image_exists("a").await.unwrap());
        fake.pull_image("b", Some("amd64")).await.unwrap();
        fake.launch_container("c", &resolved()).await.unwrap();

        assert_eq!(fake.image_exists_calls().await, vec!["a"]);
        assert_eq!(
            fake.pull_calls().await,
            vec![PullCall {
                image: "b".to_string(),
                architecture: Some("amd64".to_string()),
            }]
        );
        assert_eq!(fake.launch_calls().await, vec!["c"]);
    }

    #[tokio::test]
    async fn test_fake_scripted_failures() {
        let fake = FakeBackend::with_config(FakeConfig {
            image_exists_error: Some("boom".to_string()),
            launch_error: Some("no runtime".to_string()),
            ..Default::default()
        });
        assert!(fake.image_exists("a").await.is_err());
        assert!(fake.launch_container("a", &resolved()).await.is_err());
        assert_eq!(fake.pipe_stats().created(), 0);
    }

    #[tokio::test]
    async fn test_container_side_is_connected() {
        let fake = FakeBackend::new();
        let mut io = fake.launch_container("c", &resolved()).await.unwrap();
        let mut container = fake.take_container().await.unwrap();

        io.stdin.write_all(b"in").await.unwrap();
        let mut buf = [0u8; 2];
        container.stdin.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"in");

        container.stdout.write_all(b"out").await.unwrap();
        let mut buf = [0u8; 3];
        io.stdout.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"out");

        let stats = fake.pipe_stats();
        assert_eq!(stats.live(), 2);
        drop(io);
        assert_eq!(stats.live(), 0);
    }
}
