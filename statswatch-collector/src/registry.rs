//! Service registry abstraction.
//!
//! The collector never talks to a concrete discovery system directly. It
//! consumes a [`Registry`], which may be an in-process [`MemoryRegistry`] or
//! one of the adapters in `statswatch-adapters`.

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Metadata key naming the transport a node speaks.
pub const PROTOCOL_KEY: &str = "protocol";

/// A single running node of a service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub id: String,
    pub address: String,
    pub metadata: BTreeMap<String, String>,
}

impl Node {
    /// Create a node with no metadata.
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Shorthand for `with_metadata("protocol", ..)`.
    pub fn with_protocol(self, protocol: impl Into<String>) -> Self {
        self.with_metadata(PROTOCOL_KEY, protocol)
    }

    /// The transport this node declares, if any.
    pub fn protocol(&self) -> Option<&str> {
        self.metadata.get(PROTOCOL_KEY).map(String::as_str)
    }
}

/// A registered service version and its nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub name: String,
    pub version: String,
    pub metadata: BTreeMap<String, String>,
    pub nodes: Vec<Node>,
}

impl Service {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }
}

/// Trait for looking up registered services.
///
/// `list_services` may return services without their nodes populated;
/// `get_service` must return them with nodes.
#[async_trait]
pub trait Registry: Send + Sync + Debug {
    /// List every registered service.
    async fn list_services(&self) -> Result<Vec<Service>, RegistryError>;

    /// Look up every version of one service, nodes included.
    async fn get_service(&self, name: &str) -> Result<Vec<Service>, RegistryError>;
}

/// An in-process registry.
///
/// Useful for tests and for embedding the collector next to a fixed set of
/// services. `list_services` deliberately strips nodes, like registries that
/// only index names, so callers exercise the `get_service` path.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    services: RwLock<Vec<Service>>,
    offline: RwLock<bool>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service version, replacing an existing entry with the same
    /// name and version.
    pub fn register(&self, service: Service) {
        let mut services = self.services.write();
        services.retain(|s| !(s.name == service.name && s.version == service.version));
        services.push(service);
    }

    /// Remove every version of a service. Returns `true` if anything was removed.
    pub fn deregister(&self, name: &str) -> bool {
        let mut services = self.services.write();
        let before = services.len();
        services.retain(|s| s.name != name);
        services.len() != before
    }

    /// Make every lookup fail, simulating an unreachable registry.
    pub fn set_offline(&self, offline: bool) {
        *self.offline.write() = offline;
    }

    fn check_online(&self) -> Result<(), RegistryError> {
        if *self.offline.read() {
            Err(RegistryError::Unavailable("registry offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn list_services(&self) -> Result<Vec<Service>, RegistryError> {
        self.check_online()?;
        Ok(self
            .services
            .read()
            .iter()
            .map(|s| Service {
                nodes: Vec::new(),
                ..s.clone()
            })
            .collect())
    }

    async fn get_service(&self, name: &str) -> Result<Vec<Service>, RegistryError> {
        self.check_online()?;
        let found: Vec<Service> = self
            .services
            .read()
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect();

        if found.is_empty() {
            return Err(RegistryError::NotFound(name.to_string()));
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_strips_nodes_and_get_returns_them() {
        let registry = MemoryRegistry::new();
        registry.register(Service::new("svc", "v1").with_node(Node::new("n1", "a:1")));

        let listed = registry.list_services().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].nodes.is_empty());

        let fetched = registry.get_service("svc").await.unwrap();
        assert_eq!(fetched[0].nodes.len(), 1);
    }

    #[tokio::test]
    async fn register_replaces_same_version() {
        let registry = MemoryRegistry::new();
        registry.register(Service::new("svc", "v1").with_node(Node::new("n1", "a:1")));
        registry.register(Service::new("svc", "v1").with_node(Node::new("n2", "a:2")));
        registry.register(Service::new("svc", "v2"));

        let fetched = registry.get_service("svc").await.unwrap();
        assert_eq!(fetched.len(), 2);
        let v1 = fetched.iter().find(|s| s.version == "v1").unwrap();
        assert_eq!(v1.nodes[0].id, "n2");
    }

    #[tokio::test]
    async fn unknown_service_is_not_found() {
        let registry = MemoryRegistry::new();
        let err = registry.get_service("missing").await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn offline_registry_fails() {
        let registry = MemoryRegistry::new();
        registry.set_offline(true);
        assert!(registry.list_services().await.is_err());

        registry.set_offline(false);
        assert!(registry.list_services().await.is_ok());
    }

    #[test]
    fn deregister_removes_all_versions() {
        let registry = MemoryRegistry::new();
        registry.register(Service::new("svc", "v1"));
        registry.register(Service::new("svc", "v2"));

        assert!(registry.deregister("svc"));
        assert!(!registry.deregister("svc"));
    }

    #[test]
    fn node_protocol_from_metadata() {
        let node = Node::new("n", "a").with_protocol("http");
        assert_eq!(node.protocol(), Some("http"));
        assert_eq!(Node::new("n", "a").protocol(), None);
    }
}
