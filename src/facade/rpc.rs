//! Coalesced raw JSON-RPC reads.
//!
//! # Responsibilities
//! - Compose Transport + RequestCoalescer for RPC call sites
//! - Derive coalescing keys from serialized method + params
//! - Offer typed helpers for the common hex-quantity reads

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::coalesce::{ExecuteOptions, RequestCoalescer};
use crate::config::CoalescerConfig;
use crate::transport::{Transport, TransportError};

/// Errors from the typed read helpers.
#[derive(Debug, Error)]
pub enum RpcReadError {
    #[error(transparent)]
    Transport(#[from] Arc<TransportError>),

    /// Endpoint answered, but not with a hex quantity.
    #[error("malformed quantity in response: {0}")]
    Malformed(String),
}

/// Thin call-site wrapper: every read goes through the coalescer, so
/// concurrent widgets asking for the same state share one round trip.
pub struct RpcReader {
    transport: Arc<Transport>,
    coalescer: Arc<RequestCoalescer<Value, TransportError>>,
}

impl RpcReader {
    pub fn new(transport: Arc<Transport>, config: CoalescerConfig) -> Self {
        Self {
            transport,
            coalescer: Arc::new(RequestCoalescer::new(config)),
        }
    }

    /// The coalescer backing this reader, for diagnostics and cleanup.
    pub fn coalescer(&self) -> &Arc<RequestCoalescer<Value, TransportError>> {
        &self.coalescer
    }

    /// Coalesced RPC call with the configured default options.
    pub async fn call(&self, method: &str, params: &[Value]) -> Result<Value, Arc<TransportError>> {
        self.call_with(method, params, self.coalescer.defaults()).await
    }

    /// Coalesced RPC call with explicit per-call options.
    pub async fn call_with(
        &self,
        method: &str,
        params: &[Value],
        options: ExecuteOptions,
    ) -> Result<Value, Arc<TransportError>> {
        let key = request_key(method, params);
        let transport = Arc::clone(&self.transport);
        let method = method.to_string();
        let params = params.to_vec();
        self.coalescer
            .execute(
                &key,
                move || async move { transport.request(&method, &params).await },
                options,
            )
            .await
    }

    /// Latest block number. Deduplicated over a 2s window: this is the read
    /// every widget wants at the same moment.
    pub async fn block_number(&self) -> Result<u64, RpcReadError> {
        let options = ExecuteOptions {
            dedup_window: Duration::from_secs(2),
            ..self.coalescer.defaults()
        };
        let value = self.call_with("eth_blockNumber", &[], options).await?;
        let quantity = parse_quantity(&value)?;
        u64::try_from(quantity)
            .map_err(|_| RpcReadError::Malformed(format!("block number out of range: {}", value)))
    }

    /// Balance of an address at the latest block, in wei.
    pub async fn balance(&self, address: &str) -> Result<u128, RpcReadError> {
        let params = vec![Value::String(address.to_string()), Value::String("latest".into())];
        let value = self.call("eth_getBalance", &params).await?;
        parse_quantity(&value)
    }
}

/// Coalescing key: serialized method + params uniquely identify the read.
fn request_key(method: &str, params: &[Value]) -> String {
    let params = serde_json::to_string(params).unwrap_or_default();
    format!("{}:{}", method, params)
}

/// Parse a JSON-RPC hex quantity ("0x1b4") into an integer.
fn parse_quantity(value: &Value) -> Result<u128, RpcReadError> {
    let text = value
        .as_str()
        .ok_or_else(|| RpcReadError::Malformed(value.to_string()))?;
    let digits = text.strip_prefix("0x").unwrap_or(text);
    u128::from_str_radix(digits, 16)
        .map_err(|e| RpcReadError::Malformed(format!("{}: {}", text, e)))
}
