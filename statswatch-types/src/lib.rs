//! # statswatch-types
//!
//! Core types for collecting runtime statistics from service nodes. This
//! crate defines the records a collector stores and the request/response
//! shapes used to query it.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable `serde` and/or `minicbor` features as needed
//! - **Transport agnostic**: The same types travel over HTTP, CBOR or in-process calls
//! - **Immutable records**: A [`Snapshot`] is built once per successful scrape
//!
//! ## Features
//!
//! - `std` (default): Standard library support
//! - `serde`: JSON/MessagePack/etc. serialization via serde
//! - `minicbor`: Compact binary serialization via CBOR
//! - `all`: Enable all serialization formats
//!
//! ## Example
//!
//! ```rust
//! use statswatch_types::{ReadRequest, ServiceFilter, Snapshot};
//!
//! let snapshot = Snapshot::builder()
//!     .service("go.micro.srv.greeter", "1.0.0")
//!     .node("greeter-1", "10.0.0.7:8080")
//!     .memory(48 * 1024 * 1024)
//!     .threads(12)
//!     .requests(1500)
//!     .timestamp(1703160000)
//!     .build();
//!
//! let request = ReadRequest::current().with_service(ServiceFilter::name("go.micro.srv.greeter"));
//! assert!(request.matches(&snapshot));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod query;
mod snapshot;
mod stats;

pub use query::*;
pub use snapshot::*;
pub use stats::*;

/// Name of the remote method every node exposes for runtime statistics.
pub const STATS_METHOD: &str = "Debug.Stats";
