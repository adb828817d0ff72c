//! Snapshot - one node's runtime statistics at a point in time.

use alloc::string::String;

/// Identity of the node a snapshot was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct NodeRef {
    /// Registry-assigned node id.
    #[cfg_attr(feature = "minicbor", n(0))]
    pub id: String,

    /// Network address the node was scraped at.
    #[cfg_attr(feature = "minicbor", n(1))]
    pub address: String,
}

/// Identity of the service instance a snapshot belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct ServiceRef {
    /// Service name (e.g., "go.micro.srv.greeter").
    #[cfg_attr(feature = "minicbor", n(0))]
    pub name: String,

    /// Service version.
    #[cfg_attr(feature = "minicbor", n(1))]
    pub version: String,

    /// The node within the service.
    #[cfg_attr(feature = "minicbor", n(2))]
    pub node: NodeRef,
}

/// Runtime statistics of a single node, captured by one scrape.
///
/// Snapshots are immutable: a collector creates one for every node that
/// answered a scrape tick and never modifies it afterwards.
///
/// Two timestamps are carried and they mean different things:
/// `started` is what the node reported about itself, `timestamp` is the
/// collector's wall clock at the moment the response arrived.
///
/// # Example
///
/// ```rust
/// use statswatch_types::Snapshot;
///
/// let snapshot = Snapshot::builder()
///     .service("billing", "2.1.0")
///     .node("billing-a", "10.1.0.3:9000")
///     .uptime(3600)
///     .errors(2)
///     .build();
///
/// assert_eq!(snapshot.service.name, "billing");
/// assert_eq!(snapshot.errors, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct Snapshot {
    /// Which service and node this snapshot describes.
    #[cfg_attr(feature = "minicbor", n(0))]
    pub service: ServiceRef,

    /// Unix timestamp in seconds when the node started, as reported by the node.
    #[cfg_attr(feature = "minicbor", n(1))]
    pub started: i64,

    /// Seconds the node has been running.
    #[cfg_attr(feature = "minicbor", n(2))]
    pub uptime: u64,

    /// Heap memory in use, in bytes.
    #[cfg_attr(feature = "minicbor", n(3))]
    pub memory: u64,

    /// Number of live threads (or green threads, depending on the runtime).
    #[cfg_attr(feature = "minicbor", n(4))]
    pub threads: u64,

    /// Garbage collection count or pause total, as the runtime reports it.
    #[cfg_attr(feature = "minicbor", n(5))]
    pub gc: u64,

    /// Total requests served.
    #[cfg_attr(feature = "minicbor", n(6))]
    pub requests: u64,

    /// Total requests that failed.
    #[cfg_attr(feature = "minicbor", n(7))]
    pub errors: u64,

    /// Unix timestamp in seconds when the collector captured this snapshot.
    #[cfg_attr(feature = "minicbor", n(8))]
    pub timestamp: u64,
}

impl Snapshot {
    /// Create a builder for constructing snapshots.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    /// Service name shorthand.
    pub fn name(&self) -> &str {
        &self.service.name
    }

    /// Service version shorthand.
    pub fn version(&self) -> &str {
        &self.service.version
    }

    /// Node id shorthand.
    pub fn node_id(&self) -> &str {
        &self.service.node.id
    }
}

/// Builder for constructing `Snapshot` instances.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: Snapshot,
    timestamp: Option<u64>,
}

impl SnapshotBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service name and version.
    pub fn service(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.snapshot.service.name = name.into();
        self.snapshot.service.version = version.into();
        self
    }

    /// Set the node id and address.
    pub fn node(mut self, id: impl Into<String>, address: impl Into<String>) -> Self {
        self.snapshot.service.node = NodeRef {
            id: id.into(),
            address: address.into(),
        };
        self
    }

    pub fn started(mut self, started: i64) -> Self {
        self.snapshot.started = started;
        self
    }

    pub fn uptime(mut self, uptime: u64) -> Self {
        self.snapshot.uptime = uptime;
        self
    }

    pub fn memory(mut self, memory: u64) -> Self {
        self.snapshot.memory = memory;
        self
    }

    pub fn threads(mut self, threads: u64) -> Self {
        self.snapshot.threads = threads;
        self
    }

    pub fn gc(mut self, gc: u64) -> Self {
        self.snapshot.gc = gc;
        self
    }

    pub fn requests(mut self, requests: u64) -> Self {
        self.snapshot.requests = requests;
        self
    }

    pub fn errors(mut self, errors: u64) -> Self {
        self.snapshot.errors = errors;
        self
    }

    /// Set a specific capture timestamp (seconds since Unix epoch).
    pub fn timestamp(mut self, ts: u64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Build the snapshot, stamping it with the current time unless a
    /// timestamp was set explicitly.
    #[cfg(feature = "std")]
    pub fn build(self) -> Snapshot {
        Snapshot {
            timestamp: self.timestamp.unwrap_or_else(current_timestamp_secs),
            ..self.snapshot
        }
    }

    /// Build the snapshot with a specific timestamp (for no_std).
    #[cfg(not(feature = "std"))]
    pub fn build(self) -> Snapshot {
        Snapshot {
            timestamp: self.timestamp.unwrap_or(0),
            ..self.snapshot
        }
    }
}

/// Get current timestamp in seconds since Unix epoch.
#[cfg(feature = "std")]
pub fn current_timestamp_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
