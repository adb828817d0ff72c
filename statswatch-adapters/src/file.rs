//! Registry backed by a JSON file.
//!
//! The file holds a list of services with their nodes:
//!
//! ```json
//! [
//!   {
//!     "name": "orders",
//!     "version": "v1",
//!     "nodes": [
//!       { "id": "orders-1", "address": "10.0.0.1:9000", "metadata": { "protocol": "http" } }
//!     ]
//!   }
//! ]
//! ```
//!
//! It is re-read on every lookup, so edits show up at the next directory
//! refresh without restarting anything.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use statswatch_collector::{Registry, RegistryError, Service};
use tracing::debug;

use crate::AdapterError;

/// A registry that reads its services from a JSON file.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Service>, AdapterError> {
        let contents = tokio::fs::read(&self.path).await?;
        let services: Vec<Service> = serde_json::from_slice(&contents)?;
        debug!(path = %self.path.display(), services = services.len(), "loaded registry file");
        Ok(services)
    }
}

#[async_trait]
impl Registry for FileRegistry {
    async fn list_services(&self) -> Result<Vec<Service>, RegistryError> {
        Ok(self.load().await?)
    }

    async fn get_service(&self, name: &str) -> Result<Vec<Service>, RegistryError> {
        let found: Vec<Service> = self
            .load()
            .await?
            .into_iter()
            .filter(|s| s.name == name)
            .collect();

        if found.is_empty() {
            return Err(AdapterError::NotFound(name.to_string()).into());
        }
        Ok(found)
    }
}
