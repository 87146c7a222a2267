//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject configs that would make the pool unusable (zero endpoints)
//! - Validate value ranges (timeouts > 0, windows > 0)
//! - Detect duplicate endpoint identities
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RpcConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use url::Url;

use crate::config::schema::RpcConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &RpcConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.pool.endpoints.is_empty() {
        errors.push(ValidationError {
            field: "pool.endpoints".into(),
            message: "at least one endpoint is required".into(),
        });
    }

    let mut seen = HashSet::new();
    for (i, endpoint) in config.pool.endpoints.iter().enumerate() {
        if Url::parse(&endpoint.url).is_err() {
            errors.push(ValidationError {
                field: format!("pool.endpoints[{}].url", i),
                message: format!("invalid URL for endpoint '{}'", endpoint.identity),
            });
        }
        if endpoint.identity.is_empty() {
            errors.push(ValidationError {
                field: format!("pool.endpoints[{}].identity", i),
                message: "identity must not be empty".into(),
            });
        }
        if !seen.insert(endpoint.identity.clone()) {
            errors.push(ValidationError {
                field: format!("pool.endpoints[{}].identity", i),
                message: format!("duplicate identity '{}'", endpoint.identity),
            });
        }
    }

    if config.pool.max_failures == 0 {
        errors.push(ValidationError {
            field: "pool.max_failures".into(),
            message: "must be at least 1".into(),
        });
    }
    if config.pool.cooldown_window_ms == 0 {
        errors.push(ValidationError {
            field: "pool.cooldown_window_ms".into(),
            message: "must be greater than zero".into(),
        });
    }
    if config.transport.timeout_ms == 0 {
        errors.push(ValidationError {
            field: "transport.timeout_ms".into(),
            message: "must be greater than zero".into(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
