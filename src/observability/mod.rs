//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pool / transport / coalesce produce:
//!     → tracing events (structured log events, endpoint identities only)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → whatever subscriber/exporter the embedding application installs
//!     → operator status panels read EndpointPool::status() and
//!       RequestCoalescer::stats() directly
//! ```
//!
//! # Design Decisions
//! - This crate records, the application exports: no subscriber or
//!   Prometheus endpoint is installed here
//! - Endpoint URLs may embed provider keys; logs and metric labels carry
//!   the configured identity instead

pub mod metrics;
