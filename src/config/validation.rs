//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check addresses parse and the discovery verb is a standard method
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RunnerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::Method;

use crate::config::schema::RunnerConfig;

/// A single semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_addresses must not be empty")]
    NoBindAddress,

    #[error("invalid address in {field}: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("discovery.verb is not a standard HTTP method: {0:?}")]
    InvalidVerb(String),
}

const STANDARD_METHODS: &[Method] = &[
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
];

/// Parse a discovery verb, accepting only standard methods.
pub fn parse_verb(verb: &str) -> Option<Method> {
    let method = Method::from_bytes(verb.trim().to_ascii_uppercase().as_bytes()).ok()?;
    STANDARD_METHODS.contains(&method).then_some(method)
}

/// Check `config`, collecting every problem.
pub fn validate_config(config: &RunnerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_addresses.is_empty() {
        errors.push(ValidationError::NoBindAddress);
    }
    for addr in &config.listener.bind_addresses {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                field: "listener.bind_addresses",
                value: addr.clone(),
            });
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "timeouts.request_secs",
        });
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::Zero {
            field: "limits.max_body_bytes",
        });
    }

    if parse_verb(&config.discovery.verb).is_none() {
        errors.push(ValidationError::InvalidVerb(config.discovery.verb.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
