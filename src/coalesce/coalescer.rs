//! Keyed single-flight request coalescing.
//!
//! # Responsibilities
//! - Guarantee at most one in-flight operation per key within a window
//! - Hand every concurrent caller the same resolved value or rejection
//! - Optionally retain a resolved value for a short TTL
//! - Evict failed entries before any caller observes the rejection

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use tokio::time::Instant;

use crate::coalesce::stats::{CallStats, KeyStats};
use crate::config::CoalescerConfig;
use crate::observability::metrics;

type SharedOp<T, E> = Shared<BoxFuture<'static, Result<T, Arc<E>>>>;

/// Per-call options for [`RequestCoalescer::execute`].
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Callers arriving while an entry is younger than this join its
    /// in-flight operation instead of starting their own.
    pub dedup_window: Duration,
    /// How long a successfully resolved value stays reusable. Zero disables
    /// retention: the entry is removed the moment the operation settles.
    pub retain_ttl: Duration,
    /// Bypass any pending or cached entry and run the operation fresh,
    /// replacing the registered entry.
    pub force: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        let config = CoalescerConfig::default();
        Self {
            dedup_window: Duration::from_millis(config.dedup_window_ms),
            retain_ttl: Duration::from_millis(config.retain_ttl_ms),
            force: false,
        }
    }
}

impl From<&CoalescerConfig> for ExecuteOptions {
    fn from(config: &CoalescerConfig) -> Self {
        Self {
            dedup_window: Duration::from_millis(config.dedup_window_ms),
            retain_ttl: Duration::from_millis(config.retain_ttl_ms),
            force: false,
        }
    }
}

enum Slot<T, E> {
    InFlight {
        shared: SharedOp<T, E>,
        started_at: Instant,
        id: u64,
    },
    Resolved {
        value: T,
        resolved_at: Instant,
        ttl: Duration,
        id: u64,
    },
}

impl<T, E> Slot<T, E> {
    fn id(&self) -> u64 {
        match self {
            Slot::InFlight { id, .. } => *id,
            Slot::Resolved { id, .. } => *id,
        }
    }
}

enum Hit<T, E> {
    Join(SharedOp<T, E>),
    Cached(T),
}

/// Generic keyed in-flight/short-TTL cache in front of any async operation.
///
/// One coalescer serves one operation family (`T`/`E` fixed); construct one
/// per family (RPC reads, GraphQL queries) and share it via `Arc`.
///
/// Rejections reach every joined caller as `Arc<E>` wrapping the original
/// operation error, unmodified. Failures are never cached: the entry is
/// evicted inside the shared operation itself, before any caller observes
/// the rejection, so the very next call starts fresh.
///
/// The coalescer imposes no timeout of its own. If the wrapped operation
/// never settles, every joined caller stays pending — wrap long-running
/// operations with their own timeout before passing them in.
pub struct RequestCoalescer<T, E> {
    entries: Arc<DashMap<String, Slot<T, E>>>,
    stats: CallStats,
    defaults: ExecuteOptions,
    next_id: AtomicU64,
}

impl<T, E> RequestCoalescer<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(config: CoalescerConfig) -> Self {
        let defaults = ExecuteOptions::from(&config);
        Self {
            entries: Arc::new(DashMap::new()),
            stats: CallStats::new(Duration::from_millis(config.stats_retention_ms)),
            defaults,
            next_id: AtomicU64::new(1),
        }
    }

    /// The configured per-call defaults.
    pub fn defaults(&self) -> ExecuteOptions {
        self.defaults.clone()
    }

    /// Execute `operation` under `key` with the configured defaults.
    pub async fn execute_default<F, Fut>(&self, key: &str, operation: F) -> Result<T, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.execute(key, operation, self.defaults.clone()).await
    }

    /// Execute `operation` under `key`.
    ///
    /// If an operation for `key` is already in flight and younger than the
    /// dedup window, the caller joins it and `operation` is never invoked.
    /// A value resolved within its retention TTL is returned immediately.
    /// Otherwise (or with `force`) the operation runs fresh and replaces
    /// the registered entry.
    ///
    /// `operation` is only called to construct the future; it runs while an
    /// internal map shard is locked and must return promptly without
    /// re-entering this coalescer.
    pub async fn execute<F, Fut>(
        &self,
        key: &str,
        operation: F,
        options: ExecuteOptions,
    ) -> Result<T, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.stats.record(key);
        let now = Instant::now();

        // Check and insert under the entry guard: single-flight holds even
        // when callers race on a multi-threaded runtime.
        let shared = match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                let hit = if options.force {
                    None
                } else {
                    match occupied.get() {
                        Slot::InFlight { shared, started_at, .. }
                            if now.duration_since(*started_at) < options.dedup_window =>
                        {
                            Some(Hit::Join(shared.clone()))
                        }
                        Slot::Resolved { value, resolved_at, ttl, .. }
                            if now.duration_since(*resolved_at) < *ttl =>
                        {
                            Some(Hit::Cached(value.clone()))
                        }
                        _ => None,
                    }
                };
                match hit {
                    Some(Hit::Join(shared)) => {
                        metrics::record_coalescer_call("joined");
                        tracing::debug!(key, "Joining in-flight request");
                        drop(occupied);
                        return shared.await;
                    }
                    Some(Hit::Cached(value)) => {
                        metrics::record_coalescer_call("cached");
                        tracing::debug!(key, "Serving retained value");
                        return Ok(value);
                    }
                    None => {
                        let (shared, id) = self.register(key, operation, options.retain_ttl);
                        occupied
                            .insert(Slot::InFlight { shared: shared.clone(), started_at: now, id });
                        shared
                    }
                }
            }
            MapEntry::Vacant(vacant) => {
                let (shared, id) = self.register(key, operation, options.retain_ttl);
                vacant.insert(Slot::InFlight { shared: shared.clone(), started_at: now, id });
                shared
            }
        };

        metrics::record_coalescer_call("fresh");
        shared.await
    }

    /// Build the shared operation future. Settlement bookkeeping runs inside
    /// the future itself, before any caller observes the result: a retained
    /// success becomes a `Resolved` entry, everything else is evicted. The
    /// generation id guards against clobbering a force-replacement.
    fn register<F, Fut>(
        &self,
        key: &str,
        operation: F,
        retain_ttl: Duration,
    ) -> (SharedOp<T, E>, u64)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let entries = Arc::clone(&self.entries);
        let key = key.to_string();
        let future = operation();

        let shared = async move {
            let result = future.await.map_err(Arc::new);
            match &result {
                Ok(value) if retain_ttl > Duration::ZERO => {
                    if let Some(mut slot) = entries.get_mut(&key) {
                        if slot.id() == id {
                            *slot = Slot::Resolved {
                                value: value.clone(),
                                resolved_at: Instant::now(),
                                ttl: retain_ttl,
                                id,
                            };
                        }
                    }
                }
                _ => {
                    entries.remove_if(&key, |_, slot| slot.id() == id);
                }
            }
            result
        }
        .boxed()
        .shared();

        (shared, id)
    }

    /// Snapshot of per-key call telemetry for diagnostic tooling.
    pub fn stats(&self) -> HashMap<String, KeyStats> {
        self.stats.snapshot()
    }

    /// Purge idle stats and expired retained values to bound memory.
    pub fn cleanup(&self) {
        let purged_stats = self.stats.purge_idle();
        let before = self.entries.len();
        self.entries.retain(|_, slot| match slot {
            Slot::InFlight { .. } => true,
            Slot::Resolved { resolved_at, ttl, .. } => resolved_at.elapsed() < *ttl,
        });
        let purged_entries = before - self.entries.len();
        if purged_stats > 0 || purged_entries > 0 {
            tracing::debug!(purged_stats, purged_entries, "Coalescer cleanup");
        }
    }

    /// Number of live entries (in-flight plus retained).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T, E> std::fmt::Debug for RequestCoalescer<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCoalescer")
            .field("entries", &self.entries.len())
            .field("tracked_keys", &self.stats.len())
            .finish()
    }
}
