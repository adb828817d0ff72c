//! Cached list of service instances, refreshed from a registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::registry::{Registry, Service};

/// The best-known set of service instances.
///
/// The list is held behind an `Arc` and swapped as a whole, so readers take
/// a cheap copy with [`Directory::snapshot`] and never see a half-applied
/// refresh. Scrape ticks read the snapshot without holding the lock during
/// network calls.
#[derive(Debug, Default)]
pub struct Directory {
    services: RwLock<Arc<Vec<Service>>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current list of services.
    pub fn snapshot(&self) -> Arc<Vec<Service>> {
        self.services.read().clone()
    }

    /// Number of service versions currently known.
    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    /// Total number of nodes across all services.
    pub fn node_count(&self) -> usize {
        self.services.read().iter().map(|s| s.nodes.len()).sum()
    }

    /// Replace the directory contents.
    pub fn replace(&self, services: Vec<Service>) {
        *self.services.write() = Arc::new(services);
    }

    /// Rescan the registry and swap in the result.
    ///
    /// Services listed without nodes are looked up by name; every result is
    /// keyed by `(name, version)` so a service reported twice appears once.
    /// A failed per-service lookup drops that service from this scan only.
    /// If listing itself fails the previous directory is kept and the error
    /// is returned.
    ///
    /// Returns the number of service versions now in the directory.
    pub async fn refresh(&self, registry: &dyn Registry) -> Result<usize, RegistryError> {
        let listed = registry.list_services().await?;

        let mut by_identity: BTreeMap<(String, String), Service> = BTreeMap::new();

        for service in listed {
            if !service.nodes.is_empty() {
                by_identity.insert((service.name.clone(), service.version.clone()), service);
                continue;
            }

            match registry.get_service(&service.name).await {
                Ok(versions) => {
                    for found in versions {
                        by_identity.insert((found.name.clone(), found.version.clone()), found);
                    }
                }
                Err(e) => {
                    warn!(service = %service.name, error = %e, "failed to resolve service nodes");
                }
            }
        }

        let services: Vec<Service> = by_identity.into_values().collect();
        let count = services.len();
        self.replace(services);

        debug!(services = count, "directory refreshed");
        Ok(count)
    }
}
