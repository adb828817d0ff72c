//! Error types for adapters.

use statswatch_collector::{CallError, RegistryError};
use thiserror::Error;

/// Errors that can occur inside a registry or client adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse response or file contents.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The requested service is not known.
    #[error("Service not found: {0}")]
    NotFound(String),

    /// Reading a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Parse(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else if err.is_decode() {
            AdapterError::Parse(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

impl From<AdapterError> for RegistryError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::NotFound(name) => RegistryError::NotFound(name),
            AdapterError::Parse(msg) => RegistryError::Invalid(msg),
            other => RegistryError::Unavailable(other.to_string()),
        }
    }
}

impl From<AdapterError> for CallError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Http(msg) => CallError::Remote(msg),
            AdapterError::Parse(msg) => CallError::Decode(msg),
            other => CallError::Transport(other.to_string()),
        }
    }
}
