//! JSON-RPC wire envelope and transport error definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// JSON-RPC error code for "limit exceeded", used by several providers to
/// signal rate limiting.
pub const RPC_LIMIT_EXCEEDED: i64 = -32005;

/// Outgoing JSON-RPC 2.0 request envelope.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a [Value],
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: &'a [Value]) -> Self {
        Self { jsonrpc: "2.0", id, method, params }
    }
}

/// Incoming JSON-RPC 2.0 response envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    pub result: Option<Value>,
    pub error: Option<JsonRpcErrorObject>,
}

/// RPC-level error object in a response body.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
}

impl JsonRpcErrorObject {
    /// Whether this error is a provider rate limit. A different endpoint may
    /// not be rate-limited, so these are retried like transport failures.
    pub fn is_rate_limit(&self) -> bool {
        self.code == RPC_LIMIT_EXCEEDED || self.code == 429
    }
}

/// Errors that can occur while executing an RPC call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Endpoint answered with a non-success HTTP status.
    #[error("HTTP status {status} from {identity}")]
    Http { status: u16, identity: String },

    /// Endpoint answered with an RPC-level error object.
    #[error("RPC error {code} from {identity}: {message}")]
    Rpc { code: i64, message: String, identity: String },

    /// Attempt exceeded the per-attempt timeout.
    #[error("request to {identity} timed out after {timeout_ms}ms")]
    Timeout { identity: String, timeout_ms: u64 },

    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body was not a JSON-RPC envelope.
    #[error("malformed response from {identity}: {detail}")]
    Body { identity: String, detail: String },

    /// Every retry against every eligible endpoint failed.
    #[error("all retries exhausted after {attempts} attempts")]
    Exhausted {
        attempts: u32,
        #[source]
        cause: Box<TransportError>,
    },
}

impl TransportError {
    /// Whether this failure should count as a rate limit for cooldown
    /// purposes.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            TransportError::Http { status, .. } => *status == 429,
            TransportError::Rpc { code, .. } => {
                *code == RPC_LIMIT_EXCEEDED || *code == 429
            }
            _ => false,
        }
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
