//! Endpoint pool subsystem.
//!
//! # Data Flow
//! ```text
//! Transport attempt:
//!     select_endpoint()
//!     → network call
//!     → report_success(endpoint, latency) / report_failure(endpoint, kind)
//!     → health state drives the next selection
//!
//! Operator panel:
//!     status() → read-only snapshot (identities, counts, cooldown flags)
//! ```
//!
//! # Design Decisions
//! - Rolling cooldown instead of permanent blacklisting: transient provider
//!   outages heal without an external health-check loop
//! - Fail-open reset when every endpoint is cooling down: availability is
//!   favored over strict provider preference
//! - Health records sit behind a per-endpoint mutex, never held across an
//!   await point; selection is recomputed from state on every call

pub mod endpoint;
#[allow(clippy::module_inception)]
pub mod pool;

pub use endpoint::{Endpoint, EndpointHealth, FailureKind};
pub use pool::{EndpointPool, EndpointStatus, PoolStatus};
