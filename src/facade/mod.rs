//! Consumer facades.
//!
//! # Data Flow
//! ```text
//! UI hook / query layer
//!     → RpcReader.call(method, params)      (raw or typed RPC reads)
//!     → GraphClient.query(query, variables) (index queries)
//!         both: RequestCoalescer.execute(key, op)
//!             RpcReader ops: Transport.request → EndpointPool
//!             GraphClient ops: bounded HTTP POST to the index endpoint
//! ```
//!
//! # Design Decisions
//! - Facades are thin composition, not business logic: keys are derived
//!   from the serialized request, nothing else
//! - One coalescer per operation family keeps value types concrete
//! - ABI-encoded batched reads are out of scope (no ABI encoding here)

pub mod graphql;
pub mod rpc;

pub use graphql::{GraphClient, QueryError};
pub use rpc::{RpcReadError, RpcReader};
