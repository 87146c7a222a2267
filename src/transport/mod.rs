//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! request(method, params)
//!     → pool.select_endpoint()
//!     → HTTP POST (JSON-RPC 2.0 envelope), bounded per-attempt timeout
//!     → success: pool.report_success(endpoint, latency); return result
//!     → failure: pool.report_failure(endpoint, kind); backoff; re-select
//!     → retries exhausted: TransportError::Exhausted
//! ```
//!
//! # Design Decisions
//! - RPC-level rate-limit errors are treated like transport failures for
//!   retry purposes; the pool applies a separate cooldown window to them
//! - Timeouts are per attempt, never cumulative across retries
//! - No JSON-RPC method semantics: results pass through as opaque values

pub mod client;
pub mod types;

pub use client::Transport;
pub use types::{TransportError, TransportResult};
