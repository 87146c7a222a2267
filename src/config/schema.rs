//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! resilience layer. All types derive Serde traits for deserialization from
//! config files; the application's bootstrap code assembles the final value
//! and passes it into the constructors — the core never reads the
//! environment itself.

use serde::{Deserialize, Serialize};

use crate::resilience::RetryDelay;

/// Root configuration for the RPC resilience layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RpcConfig {
    /// Endpoint pool settings (endpoints, failure thresholds, cooldowns).
    pub pool: PoolConfig,

    /// Transport settings (timeout, retries).
    pub transport: TransportConfig,

    /// Request coalescer settings (dedup window, retention).
    pub coalescer: CoalescerConfig,
}

/// A single configured RPC endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Provider URL. May embed an API key; never logged.
    pub url: String,

    /// Stable label used in logs and metrics instead of the URL.
    pub identity: String,

    /// Selection priority, lower = preferred. Ties are broken by the lowest
    /// observed latency.
    #[serde(default)]
    pub priority: u32,
}

impl EndpointConfig {
    /// The public fallback provider, always usable without an API key.
    /// Kept at the lowest priority so keyed providers win when configured.
    pub fn public_fallback() -> Self {
        Self {
            url: "https://cloudflare-eth.com".to_string(),
            identity: "public-fallback".to_string(),
            priority: u32::MAX,
        }
    }
}

/// Endpoint pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Ordered endpoint descriptors. Must not be empty.
    pub endpoints: Vec<EndpointConfig>,

    /// Consecutive failures before an endpoint enters cooldown.
    pub max_failures: u32,

    /// Rolling cooldown window in milliseconds.
    pub cooldown_window_ms: u64,

    /// Cooldown applied when the last failure was a rate limit. Defaults to
    /// the ordinary window; raise it to quarantine rate-limited providers
    /// for longer.
    pub rate_limit_cooldown_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![EndpointConfig::public_fallback()],
            max_failures: 3,
            cooldown_window_ms: 60_000,
            rate_limit_cooldown_ms: 60_000,
        }
    }
}

/// Transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Per-attempt request timeout in milliseconds (not cumulative across
    /// retries).
    pub timeout_ms: u64,

    /// Retries after the initial attempt.
    pub retry_count: u32,

    /// Delay policy between attempts.
    pub retry_delay: RetryDelay,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            retry_count: 3,
            retry_delay: RetryDelay::Fixed { delay_ms: 500 },
        }
    }
}

/// Request coalescer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CoalescerConfig {
    /// Window during which concurrent callers join an in-flight request.
    pub dedup_window_ms: u64,

    /// How long a resolved value stays reusable after completion.
    /// Zero disables retention.
    pub retain_ttl_ms: u64,

    /// Retention of idle per-key stats before cleanup purges them.
    pub stats_retention_ms: u64,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            dedup_window_ms: 500,
            retain_ttl_ms: 0,
            stats_retention_ms: 600_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RpcConfig::default();
        assert_eq!(config.pool.max_failures, 3);
        assert_eq!(config.pool.cooldown_window_ms, 60_000);
        assert_eq!(config.transport.timeout_ms, 10_000);
        assert_eq!(config.transport.retry_count, 3);
        assert_eq!(config.coalescer.dedup_window_ms, 500);
        assert_eq!(config.coalescer.retain_ttl_ms, 0);
        // There is always at least the public fallback.
        assert_eq!(config.pool.endpoints.len(), 1);
        assert_eq!(config.pool.endpoints[0].identity, "public-fallback");
        assert_eq!(config.pool.endpoints[0].priority, u32::MAX);
    }

    #[test]
    fn test_minimal_toml() {
        let config: RpcConfig = toml::from_str(
            r#"
            [[pool.endpoints]]
            url = "https://rpc.example.com/v1/key"
            identity = "primary"
            priority = 0

            [transport]
            retry_count = 2

            [transport.retry_delay]
            mode = "exponential"
            base_ms = 100
            max_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.pool.endpoints.len(), 1);
        assert_eq!(config.pool.endpoints[0].identity, "primary");
        assert_eq!(config.transport.retry_count, 2);
        assert!(matches!(
            config.transport.retry_delay,
            RetryDelay::Exponential { base_ms: 100, max_ms: 2000 }
        ));
        // Untouched sections keep their defaults.
        assert_eq!(config.coalescer.stats_retention_ms, 600_000);
    }
}
