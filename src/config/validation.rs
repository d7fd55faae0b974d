//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect duplicate or incomplete links
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::BridgeConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rpc.servers must list at least one server")]
    NoRpcServers,

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("link #{0} has an empty destination")]
    EmptyDestination(usize),

    #[error("destination `{0}` is linked more than once")]
    DuplicateDestination(String),

    #[error("link `{0}` has no usable `address` value")]
    InvalidAddress(String),
}

pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.rpc.servers.iter().all(|s| s.trim().is_empty()) {
        errors.push(ValidationError::NoRpcServers);
    }
    if config.rpc.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("rpc.timeout_ms"));
    }
    if config.server.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("server.shutdown_timeout_secs"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let mut seen = HashSet::new();
    for (index, link) in config.links.iter().enumerate() {
        let id = link.destination.as_str();
        if id.trim().is_empty() {
            errors.push(ValidationError::EmptyDestination(index));
            continue;
        }
        if !seen.insert(id) {
            errors.push(ValidationError::DuplicateDestination(id.to_string()));
        }
        if link.values.bind_address().is_err() {
            errors.push(ValidationError::InvalidAddress(id.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
