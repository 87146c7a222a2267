//! Metrics collection.
//!
//! # Responsibilities
//! - Define resilience-layer metrics (endpoint health, latency, retries,
//!   coalescer effectiveness)
//! - Track per-endpoint and aggregate counts
//!
//! # Metrics
//! - `rpc_endpoint_health` (gauge): 1=available, 0=in cooldown
//! - `rpc_request_duration_ms` (histogram): per-endpoint latency
//! - `rpc_endpoint_failures_total` (counter): failures by endpoint, kind
//! - `rpc_pool_fail_open_total` (counter): fail-open resets
//! - `rpc_coalescer_calls_total` (counter): by outcome (fresh/joined/cached)
//!
//! # Design Decisions
//! - Labels carry endpoint identities, never URLs (URLs may embed keys)
//! - Metric updates are cheap; exporter installation is the application's
//!   concern, this crate only records through the `metrics` facade

/// Record whether an endpoint is currently selectable.
pub fn record_endpoint_health(identity: &str, available: bool) {
    metrics::gauge!("rpc_endpoint_health", "endpoint" => identity.to_string())
        .set(if available { 1.0 } else { 0.0 });
}

/// Record the round-trip latency of a successful request.
pub fn record_request_latency(identity: &str, latency_ms: u64) {
    metrics::histogram!("rpc_request_duration_ms", "endpoint" => identity.to_string())
        .record(latency_ms as f64);
}

/// Record a reported failure. `kind` is "transport" or "rate_limit".
pub fn record_endpoint_failure(identity: &str, kind: &'static str) {
    metrics::counter!(
        "rpc_endpoint_failures_total",
        "endpoint" => identity.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// Record a fail-open reset of the whole pool.
pub fn record_fail_open() {
    metrics::counter!("rpc_pool_fail_open_total").increment(1);
}

/// Record a coalescer call outcome: "fresh", "joined" or "cached".
pub fn record_coalescer_call(outcome: &'static str) {
    metrics::counter!("rpc_coalescer_calls_total", "outcome" => outcome).increment(1);
}
