//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every rewrite operation name is known
//! - Validate value ranges (limits > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::RelayConfig;
use crate::rewrite::KNOWN_OPERATIONS;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be greater than 0"));
    }

    if !is_host_port(&config.origin.default_address) {
        errors.push(ValidationError::new(
            "origin.default_address",
            format!("{:?} is not host:port", config.origin.default_address),
        ));
    }

    for name in &config.rewrite.operations {
        if !KNOWN_OPERATIONS.contains(&name.as_str()) {
            errors.push(ValidationError::new(
                "rewrite.operations",
                format!("unknown operation {name:?}; expected one of {KNOWN_OPERATIONS:?}"),
            ));
        }
    }
    let uses_marker = config
        .rewrite
        .operations
        .iter()
        .any(|name| name == "remove_redirect_marker");
    if uses_marker && config.rewrite.marker().is_empty() {
        errors.push(ValidationError::new(
            "rewrite.marker_server",
            "marker must not be empty when remove_redirect_marker is enabled",
        ));
    }

    if config.limits.max_head_bytes == 0 {
        errors.push(ValidationError::new("limits.max_head_bytes", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_host_port(text: &str) -> bool {
    match text.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok_and(|p| p != 0),
        None => false,
    }
}
