//! # statswatch-collector
//!
//! Discovers running service instances, scrapes their runtime stats on a
//! fixed interval and answers queries over the latest and historical results.
//!
//! The pieces fit together like this:
//!
//! - a [`Registry`] lists services and their nodes,
//! - the [`Directory`] caches that list and is refreshed periodically,
//! - the [`Scraper`] calls `Debug.Stats` on every node through a [`Client`]
//!   and publishes one batch per tick,
//! - [`PublishedState`] keeps the current batch and a [`HistoryRing`] of past
//!   ones,
//! - the [`StatsHandler`] serves reads against that state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use statswatch_collector::{Client, Collector, MemoryRegistry, ReadRequest, ServiceFilter};
//!
//! # async fn run(client: Arc<dyn Client>) -> Result<(), Box<dyn std::error::Error>> {
//! let collector = Collector::builder()
//!     .registry(Arc::new(MemoryRegistry::new()))
//!     .client(client)
//!     .scrape_interval(Duration::from_secs(1))
//!     .build()
//!     .await?;
//!
//! let handle = collector.start();
//!
//! let handler = collector.handler();
//! let rsp = handler.read(&ReadRequest::past().with_service(ServiceFilter::name("orders")));
//! println!("{} snapshots", rsp.len());
//!
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod collector;
mod directory;
mod error;
mod handler;
mod history;
mod registry;
mod scraper;
mod state;

pub use client::{Client, Request};
pub use collector::{Collector, CollectorBuilder, CollectorConfig, CollectorHandle};
pub use directory::Directory;
pub use error::{CallError, CollectorError, RegistryError, StatsError};
pub use handler::{StatsHandler, SERVICE_ID};
pub use history::HistoryRing;
pub use registry::{MemoryRegistry, Node, Registry, Service, PROTOCOL_KEY};
pub use scraper::{Scraper, TickReport};
pub use state::{Batch, PublishedState};

// Re-export types for convenience
pub use statswatch_types::{
    NodeRef, ReadRequest, ReadResponse, ServiceFilter, ServiceRef, Snapshot, StatsRequest,
    StatsResponse, StreamRequest, WriteRequest, STATS_METHOD,
};
