//! Binary entry point: start the node, run until ctrl-c, drain consumers.

use anyhow::Result;
use node_runtime::{NodeRuntime, RuntimeConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let runtime = NodeRuntime::start(RuntimeConfig::default())?;
    info!("node running, press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    runtime.shutdown().await
}
