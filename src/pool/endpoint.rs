//! Endpoint abstraction.
//!
//! # Responsibilities
//! - Represent a single configured RPC endpoint
//! - Track health state (consecutive failures, cooldown stamp, latency)
//! - Enforce the reset-on-success invariant

use std::sync::{Mutex, MutexGuard};

use tokio::time::Instant;
use url::Url;

use crate::config::EndpointConfig;

/// Classification of a reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, connection error, HTTP error status, or RPC error payload.
    Transport,
    /// Provider signalled a rate limit (HTTP 429 or an RPC limit code).
    /// Cooled down under the pool's rate-limit window.
    RateLimited,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::RateLimited => "rate_limit",
        }
    }
}

/// Mutable health record, owned exclusively by the pool's endpoints.
#[derive(Debug, Default)]
pub struct EndpointHealth {
    /// Consecutive failures since the last success.
    pub failure_count: u32,
    /// When the most recent failure was reported.
    pub last_failure_at: Option<Instant>,
    /// Most recent successful round-trip time.
    pub last_latency_ms: Option<u64>,
    /// Whether the most recent failure was a rate limit.
    pub rate_limited: bool,
}

/// A single configured RPC endpoint with its health record.
#[derive(Debug)]
pub struct Endpoint {
    /// Provider URL. May embed an API key; log `identity` instead.
    pub url: Url,
    /// Stable label for logs and metrics.
    pub identity: String,
    /// Selection priority, lower = preferred.
    pub priority: u32,

    health: Mutex<EndpointHealth>,
}

impl Endpoint {
    pub fn new(config: &EndpointConfig) -> Result<Self, url::ParseError> {
        let url = Url::parse(&config.url)?;
        Ok(Self {
            url,
            identity: config.identity.clone(),
            priority: config.priority,
            health: Mutex::new(EndpointHealth::default()),
        })
    }

    /// Lock the health record. Never held across an await point.
    pub(crate) fn health(&self) -> MutexGuard<'_, EndpointHealth> {
        self.health.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Report a successful request. Resets the failure count unconditionally.
    pub(crate) fn mark_success(&self, latency_ms: u64) {
        let mut health = self.health();
        health.failure_count = 0;
        health.rate_limited = false;
        health.last_latency_ms = Some(latency_ms);
    }

    /// Report a failed request. Returns the new consecutive failure count.
    pub(crate) fn mark_failure(&self, kind: FailureKind) -> u32 {
        let mut health = self.health();
        health.failure_count += 1;
        health.last_failure_at = Some(Instant::now());
        health.rate_limited = kind == FailureKind::RateLimited;
        health.failure_count
    }

    /// Fail-open reset: clear failure state, keep observed latency.
    pub(crate) fn reset_failures(&self) {
        let mut health = self.health();
        health.failure_count = 0;
        health.last_failure_at = None;
        health.rate_limited = false;
    }
}
