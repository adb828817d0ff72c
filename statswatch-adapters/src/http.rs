//! HTTP registry and HTTP node client.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use statswatch_adapters::http::{HttpClient, HttpRegistry};
//! use statswatch_collector::Collector;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = HttpRegistry::builder()
//!         .endpoint("http://registry.local:8500")
//!         .build()?;
//!     let client = HttpClient::builder().build()?;
//!
//!     let collector = Collector::builder()
//!         .registry(Arc::new(registry))
//!         .client(Arc::new(client))
//!         .build()
//!         .await?;
//!
//!     let handle = collector.start();
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use statswatch_collector::{CallError, Client, Registry, RegistryError, Request, Service};

use crate::AdapterError;

/// Protocol name nodes reachable by [`HttpClient`] advertise.
pub const HTTP_PROTOCOL: &str = "http";

/// Registry that queries a registry's HTTP API.
///
/// `GET {endpoint}/services` lists services and
/// `GET {endpoint}/services/{name}` returns every version of one service
/// with its nodes.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRegistry {
    /// Create a new builder for configuring the registry.
    pub fn builder() -> HttpRegistryBuilder {
        HttpRegistryBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch(&self, path: &str, name: Option<&str>) -> Result<Vec<Service>, AdapterError> {
        let url = format!("{}{}", self.endpoint, path);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            if let Some(name) = name {
                return Err(AdapterError::NotFound(name.to_string()));
            }
        }

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn list_services(&self) -> Result<Vec<Service>, RegistryError> {
        Ok(self.fetch("/services", None).await?)
    }

    async fn get_service(&self, name: &str) -> Result<Vec<Service>, RegistryError> {
        let path = format!("/services/{}", urlencoded(name));
        let services = self.fetch(&path, Some(name)).await?;
        if services.is_empty() {
            return Err(AdapterError::NotFound(name.to_string()).into());
        }
        Ok(services)
    }
}

/// Builder for HttpRegistry.
#[derive(Debug, Default)]
pub struct HttpRegistryBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
}

impl HttpRegistryBuilder {
    /// Set the registry API endpoint (default: "http://localhost:8500").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the registry.
    pub fn build(self) -> Result<HttpRegistry, AdapterError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:8500".to_string());

        Ok(HttpRegistry {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

/// Client that calls nodes over plain HTTP.
///
/// A call to method `Debug.Stats` of service `orders` on node
/// `10.0.0.1:9000` is sent as `POST http://10.0.0.1:9000/orders/Debug.Stats`
/// with the request body as JSON.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    protocol: String,
}

impl HttpClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    async fn post(&self, request: &Request, address: &str) -> Result<serde_json::Value, AdapterError> {
        let url = call_url(address, &request.service, &request.method);
        let response = self.client.post(&url).json(&request.body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AdapterError::Http(format!("{status}: {}", detail.trim())));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Client for HttpClient {
    fn protocol(&self) -> &str {
        &self.protocol
    }

    async fn call(&self, request: &Request, address: &str) -> Result<serde_json::Value, CallError> {
        Ok(self.post(request, address).await?)
    }
}

/// Builder for HttpClient.
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    protocol: Option<String>,
    connect_timeout: Option<Duration>,
}

impl HttpClientBuilder {
    /// Set the protocol name to match against node metadata (default: "http").
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Set the TCP connect timeout (default: 1 second).
    ///
    /// The overall call deadline is enforced by the scraper.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HttpClient, AdapterError> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout.unwrap_or(Duration::from_secs(1)))
            .build()?;

        Ok(HttpClient {
            client,
            protocol: self.protocol.unwrap_or_else(|| HTTP_PROTOCOL.to_string()),
        })
    }
}

fn call_url(address: &str, service: &str, method: &str) -> String {
    let base = if address.starts_with("http://") || address.starts_with("https://") {
        address.trim_end_matches('/').to_string()
    } else {
        format!("http://{address}")
    };
    format!("{base}/{}/{}", urlencoded(service), urlencoded(method))
}

// URL encode a path segment
fn urlencoded(s: &str) -> String {
    s.replace('%', "%25").replace('/', "%2F").replace(' ', "%20")
}
