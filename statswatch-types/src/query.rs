//! Request and response shapes for querying a collector.

use alloc::string::String;
use alloc::vec::Vec;

use crate::Snapshot;

/// Selects snapshots by service identity.
///
/// An empty field matches every value, so `ServiceFilter::default()` matches
/// everything and a filter with only a name matches every version of it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct ServiceFilter {
    #[cfg_attr(feature = "minicbor", n(0))]
    pub name: String,

    #[cfg_attr(feature = "minicbor", n(1))]
    pub version: String,
}

impl ServiceFilter {
    /// Filter on a service name, any version.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
        }
    }

    /// Restrict the filter to one version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Whether the snapshot's service identity passes this filter.
    pub fn matches(&self, snapshot: &Snapshot) -> bool {
        field_matches(&snapshot.service.name, &self.name)
            && field_matches(&snapshot.service.version, &self.version)
    }
}

fn field_matches(value: &str, wanted: &str) -> bool {
    wanted.is_empty() || value == wanted
}

/// Read request: current snapshots or the retained history.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct ReadRequest {
    /// Optional service filter; `None` returns every snapshot.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    #[cfg_attr(feature = "minicbor", n(0))]
    pub service: Option<ServiceFilter>,

    /// Read the retained history instead of only the latest tick.
    #[cfg_attr(feature = "minicbor", n(1))]
    pub past: bool,
}

impl ReadRequest {
    /// Request the latest tick only.
    pub fn current() -> Self {
        Self::default()
    }

    /// Request the retained history.
    pub fn past() -> Self {
        Self {
            service: None,
            past: true,
        }
    }

    pub fn with_service(mut self, filter: ServiceFilter) -> Self {
        self.service = Some(filter);
        self
    }

    /// Whether a snapshot passes this request's filter.
    pub fn matches(&self, snapshot: &Snapshot) -> bool {
        self.service.as_ref().map_or(true, |f| f.matches(snapshot))
    }
}

/// Snapshots returned by a read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct ReadResponse {
    #[cfg_attr(feature = "minicbor", n(0))]
    pub stats: Vec<Snapshot>,
}

impl ReadResponse {
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }
}

/// Write request. Collectors are read-only and reject it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WriteRequest {
    pub stats: Vec<Snapshot>,
}

/// Stream request. Collectors reject it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StreamRequest {
    pub service: Option<ServiceFilter>,
}
