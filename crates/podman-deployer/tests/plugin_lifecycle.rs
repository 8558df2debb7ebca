//! Plugin handle I/O and teardown

mod common;

use common::{IMAGE, fake_connector};
use podman_deployer::testing::FakeConfig;
use podman_deployer::{CancellationToken, ImagePullPolicy, Plugin};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn test_write_reaches_container_and_read_returns_output() {
    let (connector, fake) = fake_connector(ImagePullPolicy::Never, FakeConfig::default());
    let plugin = connector
        .deploy_plugin(&CancellationToken::new(), IMAGE)
        .await
        .unwrap();
    let mut container = fake.take_container().await.unwrap();

    assert_eq!(plugin.write(b"request").await.unwrap(), 7);
    let mut received = [0u8; 7];
    container.stdin.read_exact(&mut received).await.unwrap();
    assert_eq!(&received, b"request");

    container.stdout.write_all(b"response").await.unwrap();
    drop(container.stdout);

    let mut output = Vec::new();
    let mut buf = [0u8; 3];
    loop {
        let n = plugin.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        output.extend_from_slice(&buf[..n]);
    }
    assert_eq!(output, b"response");
}

#[tokio::test]
async fn test_close_signals_eof_to_container() {
    let (connector, fake) = fake_connector(ImagePullPolicy::Never, FakeConfig::default());
    let plugin = connector
        .deploy_plugin(&CancellationToken::new(), IMAGE)
        .await
        .unwrap();
    let mut container = fake.take_container().await.unwrap();

    plugin.close().await.unwrap();

    let mut rest = Vec::new();
    let n = container.stdin.read_to_end(&mut rest).await.unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn test_concurrent_close_releases_pipes_once() {
    let (connector, fake) = fake_connector(ImagePullPolicy::Never, FakeConfig::default());
    let plugin = Arc::new(
        connector
            .deploy_plugin(&CancellationToken::new(), IMAGE)
            .await
            .unwrap(),
    );
    let stats = fake.pipe_stats();
    assert_eq!(stats.live(), 2);

    let first = {
        let plugin = Arc::clone(&plugin);
        tokio::spawn(async move { plugin.close().await })
    };
    let second = {
        let plugin = Arc::clone(&plugin);
        tokio::spawn(async move { plugin.close().await })
    };

    let (first, second) = tokio::time::timeout(Duration::from_secs(5), async {
        (first.await.unwrap(), second.await.unwrap())
    })
    .await
    .expect("close must not deadlock");

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert!(plugin.is_closed());
    assert_eq!(stats.shutdowns(), 1);
    assert_eq!(stats.released(), 2);
    assert_eq!(stats.live(), 0);
}

#[tokio::test]
async fn test_close_interrupts_read_from_silent_container() {
    let (connector, fake) = fake_connector(ImagePullPolicy::Never, FakeConfig::default());
    let plugin = Arc::new(
        connector
            .deploy_plugin(&CancellationToken::new(), IMAGE)
            .await
            .unwrap(),
    );
    // Kept alive but never written to and never closed
    let _container = fake.take_container().await.unwrap();

    let reader = {
        let plugin = Arc::clone(&plugin);
        tokio::spawn(async move {
            let mut buf = [0u8; 8];
            plugin.read(&mut buf).await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    tokio::time::timeout(Duration::from_secs(2), plugin.close())
        .await
        .expect("close must not wait for a pending read")
        .unwrap();

    let err = reader.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    assert_eq!(fake.pipe_stats().live(), 0);
}

#[tokio::test]
async fn test_close_interrupts_write_to_full_pipe() {
    let (connector, fake) = fake_connector(ImagePullPolicy::Never, FakeConfig::default());
    let plugin = Arc::new(
        connector
            .deploy_plugin(&CancellationToken::new(), IMAGE)
            .await
            .unwrap(),
    );
    // Never reads its stdin, so the pipe fills up
    let _container = fake.take_container().await.unwrap();

    let writer = {
        let plugin = Arc::clone(&plugin);
        tokio::spawn(async move {
            let chunk = vec![0u8; 256 * 1024];
            loop {
                if let Err(e) = plugin.write(&chunk).await {
                    return e;
                }
            }
        })
    };
    let reader = {
        let plugin = Arc::clone(&plugin);
        tokio::spawn(async move {
            let mut buf = [0u8; 8];
            plugin.read(&mut buf).await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!writer.is_finished());

    tokio::time::timeout(Duration::from_secs(2), plugin.close())
        .await
        .expect("close must not wait for pending I/O")
        .unwrap();

    let write_err = writer.await.unwrap();
    assert_eq!(write_err.kind(), io::ErrorKind::NotConnected);
    let read_err = reader.await.unwrap().unwrap_err();
    assert_eq!(read_err.kind(), io::ErrorKind::NotConnected);

    assert!(plugin.is_closed());
    assert_eq!(fake.pipe_stats().shutdowns(), 1);
    assert_eq!(fake.pipe_stats().live(), 0);
}

#[tokio::test]
async fn test_is_closed_does_not_wait_for_close() {
    let (connector, _fake) = fake_connector(ImagePullPolicy::Never, FakeConfig::default());
    let plugin = connector
        .deploy_plugin(&CancellationToken::new(), IMAGE)
        .await
        .unwrap();

    assert!(!plugin.is_closed());
    plugin.close().await.unwrap();
    assert!(plugin.is_closed());
}

#[tokio::test]
async fn test_boxed_plugin_close_is_idempotent() {
    let (connector, fake) = fake_connector(ImagePullPolicy::Never, FakeConfig::default());
    let plugin: Box<dyn Plugin> = podman_deployer::Connector::deploy(
        &connector,
        &CancellationToken::new(),
        IMAGE,
    )
    .await
    .unwrap();

    for _ in 0..3 {
        plugin.close().await.unwrap();
    }
    assert_eq!(fake.pipe_stats().shutdowns(), 1);
    assert_eq!(fake.pipe_stats().live(), 0);
}

#[tokio::test]
async fn test_dropping_plugin_releases_pipes() {
    let (connector, fake) = fake_connector(ImagePullPolicy::Never, FakeConfig::default());
    let plugin = connector
        .deploy_plugin(&CancellationToken::new(), IMAGE)
        .await
        .unwrap();

    assert_eq!(fake.pipe_stats().live(), 2);
    drop(plugin);
    assert_eq!(fake.pipe_stats().live(), 0);
}
