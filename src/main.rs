//! HTTP ingress bridge.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                     HTTP BRIDGE                       │
//!                      │                                                       │
//!   link announced     │  ┌──────────┐    ┌──────────────┐                    │
//!   ───────────────────┼─▶│ provider │───▶│link registry │──▶ start / stop     │
//!   link withdrawn     │  │  facade  │    │ id → server  │    bridge servers   │
//!                      │  └──────────┘    └──────────────┘                    │
//!                      │                                                       │
//!   Client Request     │  ┌──────────┐    ┌───────────┐    ┌─────────┐        │
//!   ───────────────────┼─▶│  bridge  │───▶│ translate │───▶│   rpc   │────────┼──▶ Destination
//!                      │  │  server  │    │ + codec   │    │  call   │        │
//!   Client Response    │  │          │    │           │    │         │        │
//!   ◀──────────────────┼──│          │◀───│           │◀───│         │◀───────┼─── (reply)
//!                      │  └──────────┘    └───────────┘    └─────────┘        │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use http_bridge::config::{load_config, ConfigWatcher};
use http_bridge::http::BridgeSettings;
use http_bridge::lifecycle::{shutdown_signal, LinkSync};
use http_bridge::observability::{logging, metrics};
use http_bridge::provider::{BridgeProvider, LinkLifecycle};
use http_bridge::rpc::NatsRpcClient;

#[derive(Parser)]
#[command(name = "http-bridge")]
#[command(about = "Serve HTTP on behalf of RPC destinations", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "bridge.toml")]
    config: PathBuf,

    /// Do not reload links when the configuration file changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        links = config.links.len(),
        "http-bridge starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let rpc = NatsRpcClient::connect(&config.rpc).await?;
    let provider = Arc::new(BridgeProvider::new(
        Arc::new(rpc),
        BridgeSettings::from(&config.server),
    ));

    let mut links = LinkSync::new(provider.clone());
    links.apply(config.links.into_iter().map(Into::into)).await;

    // The watcher must outlive the loop below or updates stop.
    let (_watcher, mut updates) = if cli.no_watch {
        let (_, rx) = tokio::sync::mpsc::unbounded_channel();
        (None, rx)
    } else {
        let (watcher, rx) = ConfigWatcher::new(&cli.config);
        (Some(watcher.run()?), rx)
    };

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(update) = updates.recv() => {
                links.apply(update.links.into_iter().map(Into::into)).await;
            }
            _ = &mut shutdown => break,
        }
    }

    provider.on_shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
