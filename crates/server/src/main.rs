//! hearth-sw server entry point.
//!
//! Boots the offline cache worker and exposes it as an MCP server on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use hearth_client::{FetchClient, FetchConfig, Worker, WorkerConfig};
use hearth_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.cache_version, origin = %config.origin, db = %config.db_path.display(), "starting hearth-sw");

    let db = CacheDb::open(&config.db_path).await?;
    let fetcher = FetchClient::new(FetchConfig::from(&config))?;
    let worker = Arc::new(Worker::new(WorkerConfig::from_app(&config)?, db, fetcher));

    // Registration installs and activates right away. A failed install leaves
    // the worker redundant; sw_install retries it.
    if let Err(err) = worker.start().await {
        tracing::warn!(error = %err, "worker did not start; waiting for sw_install");
    }

    let handler = handler::HearthServer::new(worker);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
