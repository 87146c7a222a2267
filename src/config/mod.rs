//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or bootstrap-assembled value
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RpcConfig (validated, immutable)
//!     → passed by value into EndpointPool / Transport / RequestCoalescer
//! ```
//!
//! # Design Decisions
//! - Endpoints are static for the process lifetime; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Zero endpoints is fatal at load time: the pool must never be
//!   constructible in a state where selection could fail

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{CoalescerConfig, EndpointConfig, PoolConfig, RpcConfig, TransportConfig};
pub use validation::{validate_config, ValidationError};
