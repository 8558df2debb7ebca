//! Deploy a plugin image and exchange one message with it
//!
//! ```text
//! PODMAN_DEPLOYER_PULL_POLICY=IfNotPresent \
//!     cargo run --example deploy -- quay.io/arcalot/example-plugin:latest
//! ```

use podman_deployer::{CancellationToken, Config, Connector, Plugin, PodmanConnectorFactory};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let image = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: deploy <image>"))?;

    let factory = PodmanConnectorFactory::new();
    let connector = factory.create(Config::from_env()?)?;
    println!("Deployer: {}", factory.id());
    println!("Podman:   {}", connector.config().binary_path().display());

    let ctx = CancellationToken::new();
    let plugin = tokio::select! {
        result = connector.deploy(&ctx, &image) => result?,
        _ = tokio::signal::ctrl_c() => {
            ctx.cancel();
            anyhow::bail!("interrupted");
        }
    };

    plugin.write(b"hello\n").await?;
    let mut buf = [0u8; 4096];
    let n = plugin.read(&mut buf).await?;
    println!("{}", String::from_utf8_lossy(&buf[..n]));

    plugin.close().await?;
    Ok(())
}
