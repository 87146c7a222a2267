//! Request coalescing subsystem.
//!
//! # Data Flow
//! ```text
//! execute(key, operation, options)
//!     → entry for key?
//!         in-flight, inside dedup window → join the shared future
//!         resolved, inside retention TTL → return cached value
//!         otherwise (or force)           → run operation, register entry
//!     → on settlement (inside the shared future):
//!         success + retain_ttl > 0 → entry becomes Resolved until TTL
//!         anything else            → entry evicted immediately
//! ```
//!
//! # Design Decisions
//! - Dapp UIs trigger the same reads redundantly (several widgets asking
//!   for "current block" at once); single-flight collapses them into one
//!   round trip and short-TTL retention absorbs near-simultaneous repeats
//!   without a full caching layer's invalidation complexity
//! - Failures are never cached, so one bad response cannot poison callers
//! - Protocol-agnostic: the operation is an opaque async function

pub mod coalescer;
pub mod stats;

pub use coalescer::{ExecuteOptions, RequestCoalescer};
pub use stats::KeyStats;
