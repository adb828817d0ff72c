//! RPC client abstraction used to reach individual nodes.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CallError;

/// A call to be sent to one node of a service.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub service: String,
    pub method: String,
    pub body: serde_json::Value,
}

impl Request {
    /// Build a request, encoding `body` as JSON.
    ///
    /// Encoding failures surface as [`CallError::Decode`], the same class as
    /// a malformed response.
    pub fn new(
        service: impl Into<String>,
        method: impl Into<String>,
        body: &impl Serialize,
    ) -> Result<Self, CallError> {
        Ok(Self {
            service: service.into(),
            method: method.into(),
            body: serde_json::to_value(body)?,
        })
    }
}

/// Trait for calling a method on one specific node.
///
/// Implementations do not need to enforce a deadline: the caller wraps
/// every call in its own timeout.
#[async_trait]
pub trait Client: Send + Sync + Debug {
    /// Transport name nodes advertise in their `protocol` metadata.
    ///
    /// Only nodes advertising this value are called.
    fn protocol(&self) -> &str;

    /// Send `request` to the node at `address` and return the raw response body.
    async fn call(&self, request: &Request, address: &str) -> Result<serde_json::Value, CallError>;
}
