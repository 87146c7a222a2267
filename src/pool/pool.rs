//! Endpoint pool: health-aware selection and failure reporting.
//!
//! # Responsibilities
//! - Own the set of configured endpoints and their health records
//! - Pick the best available endpoint on every call
//! - Fail open when every endpoint is in cooldown simultaneously

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::{ConfigError, PoolConfig, ValidationError};
use crate::observability::metrics;
use crate::pool::endpoint::{Endpoint, EndpointHealth, FailureKind};

/// Health-aware pool over a static set of endpoints.
///
/// Constructed once at application start and shared via `Arc`. Selection is
/// always recomputed from health state: there is no sticky "current"
/// endpoint and no explicit switch event.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: Vec<Arc<Endpoint>>,
    max_failures: u32,
    cooldown_window: Duration,
    rate_limit_cooldown: Duration,
}

impl EndpointPool {
    /// Build a pool from configuration.
    ///
    /// Fails fast if no endpoints are configured or a URL does not parse;
    /// the pool must never exist in a state where selection could fail.
    pub fn new(config: PoolConfig) -> Result<Self, ConfigError> {
        let mut errors = Vec::new();
        if config.endpoints.is_empty() {
            errors.push(ValidationError {
                field: "pool.endpoints".into(),
                message: "at least one endpoint is required".into(),
            });
        }

        let mut endpoints = Vec::with_capacity(config.endpoints.len());
        for (i, endpoint_config) in config.endpoints.iter().enumerate() {
            match Endpoint::new(endpoint_config) {
                Ok(endpoint) => endpoints.push(Arc::new(endpoint)),
                Err(e) => errors.push(ValidationError {
                    field: format!("pool.endpoints[{}].url", i),
                    message: format!("invalid URL for endpoint '{}': {}", endpoint_config.identity, e),
                }),
            }
        }

        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        tracing::info!(
            endpoints = endpoints.len(),
            max_failures = config.max_failures,
            cooldown_window_ms = config.cooldown_window_ms,
            "Endpoint pool initialized"
        );

        Ok(Self {
            endpoints,
            max_failures: config.max_failures,
            cooldown_window: Duration::from_millis(config.cooldown_window_ms),
            rate_limit_cooldown: Duration::from_millis(config.rate_limit_cooldown_ms),
        })
    }

    /// Pick the best available endpoint. Never fails.
    ///
    /// Availability excludes endpoints with `failure_count >= max_failures`
    /// whose last failure is still inside the cooldown window. If that
    /// leaves nothing, every endpoint's failure state is reset (fail-open)
    /// rather than rendering the pool permanently unusable. The available
    /// set is ordered by `(priority, last observed latency)`, unknown
    /// latency last.
    pub fn select_endpoint(&self) -> Arc<Endpoint> {
        let now = Instant::now();
        let mut available = self.rank_available(now);

        if available.is_empty() {
            tracing::warn!(
                endpoints = self.endpoints.len(),
                "All endpoints in cooldown, failing open and resetting health state"
            );
            metrics::record_fail_open();
            for endpoint in &self.endpoints {
                endpoint.reset_failures();
            }
            available = self.rank_available(now);
        }

        let selected = Arc::clone(available[0].2);
        tracing::debug!(endpoint = %selected.identity, "Selected endpoint");
        selected
    }

    /// Availability-filtered `(priority, latency, endpoint)` list, sorted
    /// best-first. Unknown latency sorts after any measured latency.
    fn rank_available(&self, now: Instant) -> Vec<(u32, u64, &Arc<Endpoint>)> {
        let mut ranked: Vec<(u32, u64, &Arc<Endpoint>)> = self
            .endpoints
            .iter()
            .filter_map(|endpoint| {
                let health = endpoint.health();
                if self.is_available(&health, now) {
                    let latency = health.last_latency_ms.unwrap_or(u64::MAX);
                    Some((endpoint.priority, latency, endpoint))
                } else {
                    None
                }
            })
            .collect();
        ranked.sort_by_key(|&(priority, latency, _)| (priority, latency));
        ranked
    }

    fn is_available(&self, health: &EndpointHealth, now: Instant) -> bool {
        if health.failure_count < self.max_failures {
            return true;
        }
        match health.last_failure_at {
            Some(at) => now.duration_since(at) >= self.cooldown_for(health),
            None => true,
        }
    }

    /// Rate-limited endpoints cool down under their own window so operators
    /// can quarantine them longer than plain connection failures.
    fn cooldown_for(&self, health: &EndpointHealth) -> Duration {
        if health.rate_limited {
            self.rate_limit_cooldown
        } else {
            self.cooldown_window
        }
    }

    /// Report a successful request: resets the failure count and records the
    /// observed latency.
    pub fn report_success(&self, endpoint: &Endpoint, latency: Duration) {
        let latency_ms = latency.as_millis() as u64;
        endpoint.mark_success(latency_ms);
        metrics::record_request_latency(&endpoint.identity, latency_ms);
        metrics::record_endpoint_health(&endpoint.identity, true);
        tracing::debug!(endpoint = %endpoint.identity, latency_ms, "Request succeeded");
    }

    /// Report a failed request. Once the failure count crosses the
    /// threshold the next `select_endpoint` call naturally skips this
    /// endpoint for the duration of the cooldown window.
    pub fn report_failure(&self, endpoint: &Endpoint, kind: FailureKind) {
        let failures = endpoint.mark_failure(kind);
        metrics::record_endpoint_failure(&endpoint.identity, kind.as_str());

        if failures == self.max_failures {
            metrics::record_endpoint_health(&endpoint.identity, false);
            tracing::warn!(
                endpoint = %endpoint.identity,
                failures,
                kind = kind.as_str(),
                "Endpoint entered cooldown"
            );
        } else {
            tracing::debug!(
                endpoint = %endpoint.identity,
                failures,
                kind = kind.as_str(),
                "Request failed"
            );
        }
    }

    /// Read-only snapshot for operator-facing status panels. Never mutates
    /// health state: if everything is in cooldown, `current` is simply the
    /// endpoint the next (fail-open) selection would prefer by priority.
    pub fn status(&self) -> PoolStatus {
        let now = Instant::now();
        let endpoints: Vec<EndpointStatus> = self
            .endpoints
            .iter()
            .map(|endpoint| {
                let health = endpoint.health();
                EndpointStatus {
                    identity: endpoint.identity.clone(),
                    priority: endpoint.priority,
                    failure_count: health.failure_count,
                    last_latency_ms: health.last_latency_ms,
                    in_cooldown: !self.is_available(&health, now),
                }
            })
            .collect();

        let current = endpoints
            .iter()
            .filter(|status| !status.in_cooldown)
            .min_by_key(|status| (status.priority, status.last_latency_ms.unwrap_or(u64::MAX)))
            .or_else(|| endpoints.iter().min_by_key(|status| status.priority))
            .cloned();

        PoolStatus { current, endpoints }
    }

    /// All configured endpoints, in configuration order.
    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        &self.endpoints
    }
}

/// Diagnostic snapshot of the pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    /// The endpoint the next selection would return.
    pub current: Option<EndpointStatus>,
    /// Every configured endpoint, in configuration order.
    pub endpoints: Vec<EndpointStatus>,
}

/// Diagnostic snapshot of one endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointStatus {
    pub identity: String,
    pub priority: u32,
    pub failure_count: u32,
    pub last_latency_ms: Option<u64>,
    pub in_cooldown: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;

    fn test_pool(max_failures: u32, cooldown_ms: u64) -> EndpointPool {
        let config = PoolConfig {
            endpoints: vec![
                endpoint_config("p1", 1),
                endpoint_config("p2", 2),
                endpoint_config("p3", 3),
            ],
            max_failures,
            cooldown_window_ms: cooldown_ms,
            rate_limit_cooldown_ms: cooldown_ms,
        };
        EndpointPool::new(config).unwrap()
    }

    fn endpoint_config(identity: &str, priority: u32) -> EndpointConfig {
        EndpointConfig {
            url: format!("https://{}.example.com", identity),
            identity: identity.to_string(),
            priority,
        }
    }

    #[test]
    fn test_zero_endpoints_rejected() {
        let config = PoolConfig {
            endpoints: Vec::new(),
            ..PoolConfig::default()
        };
        let err = EndpointPool::new(config).unwrap_err();
        assert!(err.to_string().contains("at least one endpoint"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = PoolConfig {
            endpoints: vec![EndpointConfig {
                url: "not a url".into(),
                identity: "broken".into(),
                priority: 0,
            }],
            ..PoolConfig::default()
        };
        assert!(EndpointPool::new(config).is_err());
    }

    #[tokio::test]
    async fn test_selection_respects_priority() {
        let pool = test_pool(3, 60_000);
        // P1: all healthy, lowest priority wins every time.
        for _ in 0..5 {
            assert_eq!(pool.select_endpoint().identity, "p1");
        }
    }

    #[tokio::test]
    async fn test_latency_breaks_priority_ties() {
        let config = PoolConfig {
            endpoints: vec![
                endpoint_config("slow", 1),
                endpoint_config("fast", 1),
                endpoint_config("unknown", 1),
            ],
            ..PoolConfig::default()
        };
        let pool = EndpointPool::new(config).unwrap();
        let slow = Arc::clone(&pool.endpoints()[0]);
        let fast = Arc::clone(&pool.endpoints()[1]);

        pool.report_success(&slow, Duration::from_millis(800));
        pool.report_success(&fast, Duration::from_millis(40));

        // Measured latency beats unknown; lower latency beats higher.
        assert_eq!(pool.select_endpoint().identity, "fast");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_excludes_failed_endpoint() {
        let pool = test_pool(3, 60_000);
        let p1 = Arc::clone(&pool.endpoints()[0]);

        // P2: two failures is still below the threshold.
        pool.report_failure(&p1, FailureKind::Transport);
        pool.report_failure(&p1, FailureKind::Transport);
        assert_eq!(pool.select_endpoint().identity, "p1");

        pool.report_failure(&p1, FailureKind::Transport);
        assert_eq!(pool.select_endpoint().identity, "p2");

        // Scenario A: after the cooldown window, p1 is selectable again.
        tokio::time::advance(Duration::from_millis(60_001)).await;
        assert_eq!(pool.select_endpoint().identity, "p1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_open_when_all_in_cooldown() {
        let pool = test_pool(1, 60_000);
        for endpoint in pool.endpoints() {
            pool.report_failure(endpoint, FailureKind::Transport);
        }

        // P3: selection still returns a value and resets everyone.
        let selected = pool.select_endpoint();
        assert_eq!(selected.identity, "p1");
        for endpoint in pool.endpoints() {
            assert_eq!(endpoint.health().failure_count, 0);
        }
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let pool = test_pool(3, 60_000);
        let p1 = Arc::clone(&pool.endpoints()[0]);

        pool.report_failure(&p1, FailureKind::Transport);
        pool.report_failure(&p1, FailureKind::Transport);
        pool.report_success(&p1, Duration::from_millis(120));

        // P4: any success resets the count regardless of prior value.
        let health = p1.health();
        assert_eq!(health.failure_count, 0);
        assert_eq!(health.last_latency_ms, Some(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_uses_its_own_cooldown() {
        let config = PoolConfig {
            endpoints: vec![endpoint_config("p1", 1), endpoint_config("p2", 2)],
            max_failures: 1,
            cooldown_window_ms: 1_000,
            rate_limit_cooldown_ms: 120_000,
        };
        let pool = EndpointPool::new(config).unwrap();
        let p1 = Arc::clone(&pool.endpoints()[0]);

        pool.report_failure(&p1, FailureKind::RateLimited);
        assert_eq!(pool.select_endpoint().identity, "p2");

        // Past the plain cooldown but inside the rate-limit one.
        tokio::time::advance(Duration::from_millis(2_000)).await;
        assert_eq!(pool.select_endpoint().identity, "p2");

        tokio::time::advance(Duration::from_millis(120_000)).await;
        assert_eq!(pool.select_endpoint().identity, "p1");
    }

    #[tokio::test]
    async fn test_status_snapshot_is_read_only() {
        let pool = test_pool(1, 60_000);
        let p1 = Arc::clone(&pool.endpoints()[0]);
        pool.report_failure(&p1, FailureKind::Transport);

        let status = pool.status();
        assert_eq!(status.endpoints.len(), 3);
        assert!(status.endpoints[0].in_cooldown);
        assert_eq!(status.endpoints[0].failure_count, 1);
        assert_eq!(status.current.unwrap().identity, "p2");

        // The snapshot must not have reset anything.
        assert_eq!(p1.health().failure_count, 1);
    }
}
