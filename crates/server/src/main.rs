//! vet-sw server entry point.
//!
//! Boots the cache router in front of the application origin: opens the
//! cache database, installs the current version, and serves the proxy until
//! interrupted. Logging goes to stderr as JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use vet_sw_client::{CacheRouter, FetchClient, FetchConfig, Fetcher, RouterConfig};
use vet_sw_core::CacheDb;
use vet_sw_core::config::AppConfig;

mod control;
mod error;
mod handler;
mod proxy;

#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    tracing::info!(
        version = %config.cache_version,
        origin = %config.origin,
        listen = %config.listen_addr,
        stores = %config.store_names(),
        "starting vet-sw proxy"
    );

    let storage = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open cache database {}", config.db_path.display()))?;
    let fetch_config = FetchConfig::from(&config);
    let cache_fetcher: Arc<dyn Fetcher> = Arc::new(FetchClient::new(fetch_config.clone())?);
    let upstream: Arc<dyn Fetcher> = Arc::new(FetchClient::new(fetch_config.without_size_limit())?);
    let router = Arc::new(CacheRouter::new(RouterConfig::from(&config), storage, cache_fetcher)?);

    // A failed install leaves the router redundant; the proxy then forwards everything.
    if let Err(e) = router.install().await {
        tracing::error!(error = %e, "install failed, serving without cache");
    }

    let state = handler::AppState::new(router.clone(), upstream, &config);
    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    axum::serve(listener, handler::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    router.settle_writes().await;
    tracing::info!("vet-sw proxy stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
