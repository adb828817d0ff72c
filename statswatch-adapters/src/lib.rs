//! # statswatch-adapters
//!
//! Ready-made [`Registry`](statswatch_collector::Registry) and
//! [`Client`](statswatch_collector::Client) implementations for the
//! statswatch collector.
//!
//! ## Supported Systems
//!
//! - **JSON file** (always available) - [`FileRegistry`] reads services and
//!   nodes from a file, re-read on every refresh
//! - **HTTP** (`http` feature) - `HttpRegistry` queries a registry's HTTP API
//!   and `HttpClient` calls node stats endpoints over HTTP
//!
//! ## Quick Start (file registry)
//!
//! ```rust,no_run
//! use statswatch_adapters::FileRegistry;
//! use statswatch_collector::Registry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = FileRegistry::new("services.json");
//!
//!     for service in registry.list_services().await? {
//!         println!("{} {} ({} nodes)", service.name, service.version, service.nodes.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod file;

#[cfg(feature = "http")]
pub mod http;

pub use error::AdapterError;
pub use file::FileRegistry;

#[cfg(feature = "http")]
pub use http::{HttpClient, HttpRegistry};
