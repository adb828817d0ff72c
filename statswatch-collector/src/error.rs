//! Error types for the collector.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by a [`Registry`](crate::Registry) lookup.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry could not be reached.
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    /// The named service is not registered.
    #[error("service not found: {0}")]
    NotFound(String),

    /// The registry answered with something that could not be decoded.
    #[error("invalid registry data: {0}")]
    Invalid(String),
}

/// Errors from a single node call.
#[derive(Debug, Error)]
pub enum CallError {
    /// The call did not complete within its deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// The node could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with an error.
    #[error("remote error: {0}")]
    Remote(String),

    /// The node's response did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for CallError {
    fn from(err: serde_json::Error) -> Self {
        CallError::Decode(err.to_string())
    }
}

/// Errors raised while building or running a [`Collector`](crate::Collector).
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The first directory scan failed, so there is nothing to scrape.
    #[error("initial directory scan failed: {0}")]
    InitialScan(#[source] RegistryError),

    /// A required collaborator was not supplied to the builder.
    #[error("missing {0}")]
    Missing(&'static str),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Errors returned to callers of the stats service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// The operation exists in the service contract but is not supported.
    #[error("{id}: {operation} not implemented")]
    NotImplemented {
        id: &'static str,
        operation: &'static str,
    },
}

impl StatsError {
    /// Whether the error is the caller's fault (HTTP 400 class).
    pub fn is_bad_request(&self) -> bool {
        matches!(self, StatsError::NotImplemented { .. })
    }

    /// Status code to report at an HTTP surface.
    pub fn status_code(&self) -> u16 {
        match self {
            StatsError::NotImplemented { .. } => 400,
        }
    }
}
