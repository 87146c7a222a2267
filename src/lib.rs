//! RPC resilience layer for dapp clients.
//!
//! A pool of interchangeable JSON-RPC endpoints with health-aware selection
//! and automatic failover, plus a request coalescer that collapses concurrent
//! identical reads into a single network round trip.
//!
//! # Architecture Overview
//!
//! ```text
//!   Call sites (UI hooks, query layers)
//!        │
//!        ▼
//!   ┌──────────┐  execute(key, op)  ┌──────────────────┐
//!   │  facade  │───────────────────▶│ RequestCoalescer │  single-flight +
//!   └──────────┘                    └────────┬─────────┘  short-TTL retention
//!                                            │ op()
//!                                            ▼
//!                                   ┌─────────────┐
//!                                   │  Transport  │  per-attempt timeout,
//!                                   └──────┬──────┘  retry with backoff
//!                    select_endpoint()     │     report_success/report_failure
//!                                          ▼
//!                                   ┌──────────────┐
//!                                   │ EndpointPool │  priority + cooldown,
//!                                   └──────────────┘  fail-open reset
//! ```
//!
//! The pool is constructed once at application start and passed by `Arc` to
//! every consumer; the crate takes no dependency on environment variables or
//! process-global state.

// Core subsystems
pub mod coalesce;
pub mod config;
pub mod pool;
pub mod transport;

// Call-site composition
pub mod facade;

// Cross-cutting concerns
pub mod observability;
pub mod resilience;

pub use coalesce::{ExecuteOptions, RequestCoalescer};
pub use config::RpcConfig;
pub use pool::{EndpointPool, FailureKind};
pub use transport::{Transport, TransportError};
