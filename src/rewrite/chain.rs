//! Ordered request rewriting.
//!
//! # Responsibilities
//! - Define the single-method rewrite capability
//! - Apply operations to one request in registration order
//! - Build the configured chain from operation names
//!
//! # Design Decisions
//! - Operations are immutable values; the chain is shared via `Arc` across
//!   connections without locking
//! - Later operations observe the effects of earlier ones

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::RewriteConfig;
use crate::http::HttpRequest;
use crate::rewrite::connection_close::ForceConnectionClose;
use crate::rewrite::redirect_marker::RemoveRedirectMarker;

/// A request mutation applied before forwarding.
pub trait RequestRewrite: Send + Sync + fmt::Debug {
    /// Stable name used in configuration and logs.
    fn name(&self) -> &'static str;

    /// Mutate `request` in place.
    fn apply(&self, request: &mut HttpRequest);
}

/// Operation names accepted in `[rewrite].operations`.
pub const KNOWN_OPERATIONS: &[&str] = &[RemoveRedirectMarker::NAME, ForceConnectionClose::NAME];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rewrite operation {0:?}")]
pub struct UnknownOperation(pub String);

/// Rewrite operations in the order they run.
#[derive(Debug, Clone, Default)]
pub struct RewriteChain {
    operations: Vec<Arc<dyn RequestRewrite>>,
}

impl RewriteChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation; it runs after every operation already present.
    pub fn with(mut self, operation: impl RequestRewrite + 'static) -> Self {
        self.push(operation);
        self
    }

    pub fn push(&mut self, operation: impl RequestRewrite + 'static) {
        self.operations.push(Arc::new(operation));
    }

    /// Build the chain named by configuration.
    pub fn from_config(config: &RewriteConfig) -> Result<Self, UnknownOperation> {
        let mut chain = Self::new();
        for name in &config.operations {
            match name.as_str() {
                RemoveRedirectMarker::NAME => chain.push(RemoveRedirectMarker::from_parts(
                    &config.marker_protocol,
                    &config.marker_server,
                )),
                ForceConnectionClose::NAME => chain.push(ForceConnectionClose),
                other => return Err(UnknownOperation(other.to_string())),
            }
        }
        Ok(chain)
    }

    /// Run every operation over `request`, in order.
    pub fn apply(&self, request: &mut HttpRequest) {
        for operation in &self.operations {
            operation.apply(request);
            tracing::trace!(
                operation = operation.name(),
                address = %request.address(),
                "Rewrite applied"
            );
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.operations.iter().map(|op| op.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
