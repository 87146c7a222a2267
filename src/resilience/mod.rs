//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Transport attempt fails:
//!     → backoff.rs (compute delay for the next attempt)
//!     → pool re-selection (a retry may land on a different endpoint)
//! ```
//!
//! # Design Decisions
//! - Every attempt has a deadline; the delay policy only governs the gap
//!   between attempts
//! - Jittered exponential backoff prevents thundering herd against a
//!   recovering provider
//! - Callers pick fixed or exponential per call site via configuration

pub mod backoff;

pub use backoff::RetryDelay;
