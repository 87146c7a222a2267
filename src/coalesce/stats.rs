//! Per-key call statistics for the coalescer's diagnostic surface.

use std::collections::HashMap;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// Call telemetry for one coalescing key.
#[derive(Debug, Clone)]
pub struct KeyStats {
    /// Total `execute` calls observed for this key, including joins and
    /// cache hits — the counter measures caller demand.
    pub count: u64,
    /// When the key was last requested.
    pub last_call_at: Instant,
}

/// Concurrent per-key call counters with bounded retention.
#[derive(Debug)]
pub struct CallStats {
    inner: DashMap<String, KeyStats>,
    retention: Duration,
}

impl CallStats {
    pub fn new(retention: Duration) -> Self {
        Self { inner: DashMap::new(), retention }
    }

    /// Record one call for `key`.
    pub fn record(&self, key: &str) {
        let now = Instant::now();
        self.inner
            .entry(key.to_string())
            .and_modify(|stats| {
                stats.count += 1;
                stats.last_call_at = now;
            })
            .or_insert(KeyStats { count: 1, last_call_at: now });
    }

    /// Snapshot copy for diagnostic readers; never exposes the live map.
    pub fn snapshot(&self) -> HashMap<String, KeyStats> {
        self.inner
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Drop stats for keys idle longer than the retention window.
    /// Returns how many were removed.
    pub fn purge_idle(&self) -> usize {
        let before = self.inner.len();
        let retention = self.retention;
        self.inner
            .retain(|_, stats| stats.last_call_at.elapsed() < retention);
        before - self.inner.len()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
