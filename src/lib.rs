//! statswatch library - shared between the binary and integration tests.
//!
//! The binary runs a collector against a configured registry and serves the
//! results over HTTP; this crate exposes the pieces so they can be started
//! in-process.

pub mod config;
pub mod duration;
pub mod query;
pub mod server;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use statswatch_adapters::{FileRegistry, HttpClient, HttpRegistry};
use statswatch_collector::{Collector, Registry};
use tracing::info;

pub use config::{Overrides, RegistrySource, Settings};
pub use server::StatsServer;

/// Create the registry described by `source`.
pub fn connect_registry(source: &RegistrySource) -> Result<Arc<dyn Registry>> {
    Ok(match source {
        RegistrySource::File(path) => Arc::new(FileRegistry::new(path)),
        RegistrySource::Http(url) => Arc::new(
            HttpRegistry::builder()
                .endpoint(url)
                .build()
                .context("failed to create registry client")?,
        ),
    })
}

/// Build a collector for `settings` and serve it until `shutdown` completes.
///
/// Fails without serving anything if the registry cannot be scanned or the
/// listen address cannot be bound.
pub async fn run(settings: Settings, shutdown: impl Future<Output = ()>) -> Result<()> {
    let registry = connect_registry(&settings.registry)?;
    let client = HttpClient::builder()
        .build()
        .context("failed to create node client")?;

    let collector = Collector::builder()
        .registry(registry)
        .client(Arc::new(client))
        .config(settings.collector.clone())
        .build()
        .await
        .context("failed to start collector")?;

    let server = StatsServer::bind(settings.listen, collector.handler())
        .await
        .with_context(|| format!("failed to bind {}", settings.listen))?;

    let handle = collector.start();
    let served = server.serve(shutdown).await;

    handle.shutdown().await;
    served.context("stats server failed")?;

    info!("statswatch stopped");
    Ok(())
}
