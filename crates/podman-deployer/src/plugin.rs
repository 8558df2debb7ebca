//! Duplex handle to a running plugin container
//!
//! A deployed plugin is exposed as a byte stream: writes go to the
//! container's stdin, reads come from its stdout. The handle can be shared
//! between tasks; reads and writes lock only their own half, so a reader
//! and a writer never wait on each other.
//!
//! # Closing
//!
//! `close` is serialized by a dedicated lock and releases the pipes exactly
//! once. Later (or racing) calls return `Ok(())`. Reads and writes are not
//! synchronized against `close`: it first signals every pending and future
//! I/O call to fail with `NotConnected`, which frees the half locks, then
//! shuts down stdin, drops stdout, and stops the container process.

use async_trait::async_trait;
use podman_deployer_cli::{
    ContainerBackend, ContainerIo, ContainerProcess, ContainerStdin, ContainerStdout,
};
use podman_deployer_config::ResolvedConfig;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How long `close` waits for the container to exit before signalling it
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Caller-facing byte stream to a deployed plugin
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Write bytes to the plugin's input, returning how many were accepted
    async fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Read bytes from the plugin's output; `Ok(0)` means end of stream
    async fn read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Release the plugin's pipes. Safe to call more than once.
    async fn close(&self) -> io::Result<()>;
}

/// Plugin handle backed by a podman-launched container
pub struct PodmanPlugin {
    backend: Arc<dyn ContainerBackend>,
    /// Close lock; the flag records whether teardown has finished
    lock: Mutex<bool>,
    /// Cancelled when `close` starts; pending I/O gives way to it
    closing: CancellationToken,
    image: String,
    config: Arc<ResolvedConfig>,
    stop_timeout: Duration,
    stdin: Mutex<Option<ContainerStdin>>,
    stdout: Mutex<Option<ContainerStdout>>,
    process: Mutex<Option<ContainerProcess>>,
}

impl PodmanPlugin {
    /// Wrap the stdio of a freshly launched container
    pub fn new(
        backend: Arc<dyn ContainerBackend>,
        image: impl Into<String>,
        config: Arc<ResolvedConfig>,
        io: ContainerIo,
    ) -> Self {
        Self {
            backend,
            lock: Mutex::new(false),
            closing: CancellationToken::new(),
            image: image.into(),
            config,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            stdin: Mutex::new(Some(io.stdin)),
            stdout: Mutex::new(Some(io.stdout)),
            process: Mutex::new(io.process),
        }
    }

    /// Set how long `close` waits for the container at each stop stage
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Image the container was started from
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Configuration the container was started with
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Backend that launched the container
    pub fn backend(&self) -> &Arc<dyn ContainerBackend> {
        &self.backend
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closing.is_cancelled()
    }

    /// Run an I/O step unless `close` starts first
    async fn until_closed<T, F>(&self, step: F) -> io::Result<T>
    where
        F: Future<Output = io::Result<T>>,
    {
        tokio::select! {
            biased;
            () = self.closing.cancelled() => Err(closed_error()),
            result = step => result,
        }
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "plugin is closed")
}

#[async_trait]
impl Plugin for PodmanPlugin {
    async fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.until_closed(async {
            let mut stdin = self.stdin.lock().await;
            let writer = stdin.as_mut().ok_or_else(closed_error)?;
            let n = writer.write(buf).await?;
            writer.flush().await?;
            Ok(n)
        })
        .await
    }

    async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.until_closed(async {
            let mut stdout = self.stdout.lock().await;
            let reader = stdout.as_mut().ok_or_else(closed_error)?;
            reader.read(buf).await
        })
        .await
    }

    async fn close(&self) -> io::Result<()> {
        let mut closed = self.lock.lock().await;
        if *closed {
            debug!(image = %self.image, "plugin already closed");
            return Ok(());
        }
        self.closing.cancel();

        let mut result = Ok(());

        let stdin = self.stdin.lock().await.take();
        if let Some(mut stdin) = stdin {
            match stdin.shutdown().await {
                Ok(()) => {}
                // The container already went away
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Err(e) => result = Err(e),
            }
        }

        let stdout = self.stdout.lock().await.take();
        drop(stdout);

        let process = self.process.lock().await.take();
        if let Some(process) = process
            && let Err(e) = process.terminate(self.stop_timeout).await
            && result.is_ok()
        {
            result = Err(io::Error::other(e));
        }

        *closed = true;
        info!(image = %self.image, "plugin closed");
        result
    }
}

impl std::fmt::Debug for PodmanPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PodmanPlugin")
            .field("image", &self.image)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use podman_deployer_config::Config;

    async fn plugin() -> (PodmanPlugin, FakeBackend) {
        let fake = FakeBackend::new();
        let config = Arc::new(
            Config::new()
                .with_podman_path("/usr/bin/podman")
                .resolve()
                .unwrap(),
        );
        let io = fake.launch_container("img", &config).await.unwrap();
        let backend: Arc<dyn ContainerBackend> = Arc::new(fake.clone());
        (PodmanPlugin::new(backend, "img", config, io), fake)
    }

    #[tokio::test]
    async fn test_read_write_roundtrip_through_container() {
        let (plugin, fake) = plugin().await;
        fake.spawn_echo().await;

        assert_eq!(plugin.write(b"ping").await.unwrap(), 4);
        let mut buf = [0u8; 4];
        let mut read = 0;
        while read < 4 {
            read += plugin.read(&mut buf[read..]).await.unwrap();
        }
        assert_eq!(&buf, b"ping");
        assert_eq!(plugin.image(), "img");
    }

    #[tokio::test]
    async fn test_io_after_close_is_not_connected() {
        let (plugin, _fake) = plugin().await;
        plugin.close().await.unwrap();
        assert!(plugin.is_closed());

        let err = plugin.write(b"x").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);

        let mut buf = [0u8; 1];
        let err = plugin.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[tokio::test]
    async fn test_second_close_is_noop() {
        let (plugin, fake) = plugin().await;
        plugin.close().await.unwrap();
        plugin.close().await.unwrap();

        let stats = fake.pipe_stats();
        assert_eq!(stats.shutdowns(), 1);
        assert_eq!(stats.released(), 2);
    }
}
