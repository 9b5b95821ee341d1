//! Weavenode HTTP node.
//!
//! Runs the request-processing core over the in-memory collaborator set.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (0.0.0.0:1984)
//! weavenode
//!
//! # Start with a configuration file
//! weavenode --config node.toml
//!
//! # Override the listen address
//! weavenode --config node.toml --listen 127.0.0.1:8080
//! ```
//!
//! # Configuration
//!
//! Example TOML:
//!
//! ```toml
//! listen_addr = "0.0.0.0:1984"
//!
//! [api]
//! http_logging = true
//! api_compat = true
//! subfield_queries = true
//! internal_api_secret = "change-me"
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use weavenode_chain::memory::{
    HashPow, InMemoryKeystore, InMemoryNode, InMemoryStorage, InMemoryTxSearch, LocalBridge,
    SimpleBlockBuilder, SimpleReplayPool,
};
use weavenode_http::{ApiConfig, ApiServer, ApiServerConfig, ApiState};
use weavenode_types::constants::DEFAULT_HTTP_PORT;

/// Weavenode HTTP node.
#[derive(Parser, Debug)]
#[command(name = "weavenode")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP listen address (overrides config)
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Log level filter (overrides RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Top-level node configuration.
#[derive(Debug, Clone, Deserialize)]
struct NodeConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    listen_addr: SocketAddr,

    /// API behavior flags
    #[serde(default)]
    api: ApiConfig,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_HTTP_PORT))
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            api: ApiConfig::default(),
        }
    }
}

impl NodeConfig {
    fn load(path: &PathBuf) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let node = Arc::new(InMemoryNode::new());
    let builder = Arc::new(SimpleBlockBuilder::new(node.clone()));
    let state = ApiState::new(
        node,
        Arc::new(InMemoryStorage::new()),
        Arc::new(InMemoryTxSearch::new()),
        Arc::new(LocalBridge::new()),
        Arc::new(HashPow),
        builder,
        Arc::new(SimpleReplayPool),
        Arc::new(InMemoryKeystore::generate()),
        config.api,
    );

    let listen_addr = cli.listen.unwrap_or(config.listen_addr);
    let server = ApiServer::new(ApiServerConfig { listen_addr }, state);
    let handle = server.start().await?;
    info!(addr = %handle.addr(), "weavenode started");

    signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("shutting down");
    handle.abort();
    Ok(())
}
