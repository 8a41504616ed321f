//! novelsa-offline server entry point.
//!
//! Boots logging and configuration, opens the response caches and the
//! offline store, registers the interception layer and serves MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use novelsa_client::{FetchConfig, HttpFetcher};
use novelsa_core::{AppConfig, CacheStorage, OfflineStore};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod context;
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
    tracing::info!(origin = %config.origin, version = %config.version, "Starting novelsa-offline on stdio transport");

    let caches = CacheStorage::open(&config.cache_path).await?;
    let store = OfflineStore::open(&config.store_path).await?.with_quota(config.storage_quota_bytes);
    let fetcher = Arc::new(HttpFetcher::new(FetchConfig::from(&config))?);

    let context = context::OfflineContext::start(config, caches, store, fetcher).await?;
    let handler = handler::NovelsaOfflineServer::new(context);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
