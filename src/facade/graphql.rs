//! Coalesced GraphQL index queries.
//!
//! # Responsibilities
//! - POST `{query, variables}` documents to an index/subgraph endpoint
//! - Coalesce identical concurrent queries into one round trip
//! - Surface GraphQL-level errors distinctly from transport errors
//!
//! The index endpoint is a single URL outside the RPC pool; resilience here
//! is coalescing plus a bounded timeout, not failover.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use crate::coalesce::RequestCoalescer;
use crate::config::CoalescerConfig;

/// Errors from index queries.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP status {0} from index endpoint")]
    Status(u16),

    /// The response carried a non-empty GraphQL `errors` array.
    #[error("query returned errors: {0}")]
    Graph(String),

    #[error("query timed out after {0}ms")]
    Timeout(u64),
}

/// Client for a GraphQL index endpoint with request coalescing.
pub struct GraphClient {
    http: reqwest::Client,
    url: Url,
    timeout: Duration,
    coalescer: Arc<RequestCoalescer<Value, QueryError>>,
}

impl GraphClient {
    pub fn new(url: Url, timeout: Duration, config: CoalescerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
            timeout,
            coalescer: Arc::new(RequestCoalescer::new(config)),
        }
    }

    /// The coalescer backing this client, for diagnostics and cleanup.
    pub fn coalescer(&self) -> &Arc<RequestCoalescer<Value, QueryError>> {
        &self.coalescer
    }

    /// Execute a query, returning the `data` payload. Identical concurrent
    /// queries (same document and variables) share one round trip.
    pub async fn query(&self, query: &str, variables: Value) -> Result<Value, Arc<QueryError>> {
        let key = format!("{}:{}", query, variables);
        let http = self.http.clone();
        let url = self.url.clone();
        let timeout = self.timeout;
        let body = json!({ "query": query, "variables": variables });

        self.coalescer
            .execute_default(&key, move || async move {
                // The coalescer imposes no timeout of its own; bound the
                // operation here so joined callers can never hang forever.
                let response = tokio::time::timeout(timeout, http.post(url).json(&body).send())
                    .await
                    .map_err(|_| QueryError::Timeout(timeout.as_millis() as u64))??;

                let status = response.status();
                if !status.is_success() {
                    return Err(QueryError::Status(status.as_u16()));
                }

                let payload: Value = response.json().await?;
                if let Some(errors) = payload.get("errors") {
                    let non_empty = errors.as_array().map_or(true, |list| !list.is_empty());
                    if non_empty {
                        return Err(QueryError::Graph(errors.to_string()));
                    }
                }
                Ok(payload.get("data").cloned().unwrap_or(Value::Null))
            })
            .await
    }
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("url", &self.url.as_str())
            .field("timeout_ms", &self.timeout.as_millis())
            .finish()
    }
}
