// Package gateway defines the narrow request/response interface to the cluster manager.

use serde_json::Value;

/// Transport-level failure talking to the manager. HTTP error statuses are
/// not transport failures; they come back as a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid manager url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request {method} {url} timed out after {timeout_ms}ms")]
    Timeout {
        method: String,
        url: String,
        timeout_ms: u128,
    },
    #[error("request {method} {url} failed: {reason}")]
    Connection {
        method: String,
        url: String,
        reason: String,
    },
}

/// Manager response: status code plus parsed body.
///
/// An empty body is `Value::Null`; a body that is not JSON is kept as
/// `Value::String` so callers can still report it.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses raw response bytes into a `Response`.
    pub fn from_bytes(status: u16, raw: &[u8]) -> Self {
        let body = if raw.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(raw)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(raw).into_owned()))
        };
        Self { status, body }
    }
}

/// Gateway defines the interface to the manager's control API.
///
/// Paths are relative to the cluster endpoint (`services/HDFS`,
/// `hosts/node1/host_components/`), optionally carrying a query string.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    async fn get(&self, path: &str) -> Result<Response, GatewayError>;

    async fn put(&self, path: &str, body: &Value) -> Result<Response, GatewayError>;

    async fn post(&self, path: &str, body: Option<&Value>) -> Result<Response, GatewayError>;

    async fn delete(&self, path: &str) -> Result<Response, GatewayError>;
}
