//! RPC transport with timeout, failure reporting, and endpoint failover.
//!
//! # Responsibilities
//! - Execute one logical JSON-RPC call against the pool's chosen endpoint
//! - Enforce a per-attempt timeout (not cumulative across retries)
//! - Report every outcome back to the pool
//! - Retry with a fresh endpoint selection, so a retry may land elsewhere

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::{timeout, Instant};

use crate::config::TransportConfig;
use crate::pool::{Endpoint, EndpointPool, FailureKind};
use crate::resilience::RetryDelay;
use crate::transport::types::{
    JsonRpcRequest, JsonRpcResponse, TransportError, TransportResult,
};

/// Executes JSON-RPC calls, hiding endpoint selection and failure reporting
/// from the caller.
pub struct Transport {
    pool: Arc<EndpointPool>,
    http: reqwest::Client,
    timeout: Duration,
    retry_count: u32,
    retry_delay: RetryDelay,
    next_id: AtomicU64,
}

impl Transport {
    pub fn new(pool: Arc<EndpointPool>, config: TransportConfig) -> Self {
        Self {
            pool,
            http: reqwest::Client::new(),
            timeout: Duration::from_millis(config.timeout_ms),
            retry_count: config.retry_count,
            retry_delay: config.retry_delay,
            next_id: AtomicU64::new(1),
        }
    }

    /// The pool this transport reports into.
    pub fn pool(&self) -> &Arc<EndpointPool> {
        &self.pool
    }

    /// Execute one logical RPC call.
    ///
    /// Endpoint-level failures (timeouts, HTTP errors, RPC error payloads,
    /// rate limits) are recovered by retrying against a freshly selected
    /// endpoint; the caller only sees [`TransportError::Exhausted`] once
    /// every avenue has been tried.
    pub async fn request(&self, method: &str, params: &[Value]) -> TransportResult<Value> {
        let attempts = self.retry_count.saturating_add(1);
        let mut attempt = 0u32;

        loop {
            let endpoint = self.pool.select_endpoint();
            let started = Instant::now();

            let error = match timeout(self.timeout, self.attempt(&endpoint, method, params)).await
            {
                Ok(Ok(result)) => {
                    self.pool.report_success(&endpoint, started.elapsed());
                    return Ok(result);
                }
                Ok(Err(error)) => error,
                Err(_) => TransportError::Timeout {
                    identity: endpoint.identity.clone(),
                    timeout_ms: self.timeout.as_millis() as u64,
                },
            };

            // Rate limits are retried like any transport failure (a
            // different endpoint may not be limited) but cool the endpoint
            // down under the pool's rate-limit window.
            let kind = if error.is_rate_limit() {
                FailureKind::RateLimited
            } else {
                FailureKind::Transport
            };
            self.pool.report_failure(&endpoint, kind);

            attempt += 1;
            if attempt >= attempts {
                tracing::warn!(
                    method,
                    attempts,
                    error = %error,
                    "RPC call exhausted all retries"
                );
                return Err(TransportError::Exhausted {
                    attempts,
                    cause: Box::new(error),
                });
            }

            tracing::debug!(
                method,
                endpoint = %endpoint.identity,
                attempt,
                error = %error,
                "RPC attempt failed, retrying"
            );
            let delay = self.retry_delay.for_attempt(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// One network attempt against one endpoint.
    async fn attempt(
        &self,
        endpoint: &Endpoint,
        method: &str,
        params: &[Value],
    ) -> TransportResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = JsonRpcRequest::new(id, method, params);

        let response = self
            .http
            .post(endpoint.url.clone())
            .json(&envelope)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                identity: endpoint.identity.clone(),
            });
        }

        let body: JsonRpcResponse =
            response.json().await.map_err(|e| TransportError::Body {
                identity: endpoint.identity.clone(),
                detail: e.to_string(),
            })?;

        if let Some(error) = body.error {
            return Err(TransportError::Rpc {
                code: error.code,
                message: error.message,
                identity: endpoint.identity.clone(),
            });
        }

        // `result: null` is a valid response (e.g. a receipt that does not
        // exist yet).
        Ok(body.result.unwrap_or(Value::Null))
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("timeout_ms", &self.timeout.as_millis())
            .field("retry_count", &self.retry_count)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}
