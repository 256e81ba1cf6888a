//! Error taxonomy for relayed exchanges.
//!
//! Every failure is terminal for the exchange in progress. Callers branch on
//! [`RelayError::kind`] rather than on message text.

use std::io;
use thiserror::Error;

/// Failure relaying a single HTTP exchange.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The message head could not be parsed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The source closed before the declared body length was delivered.
    #[error("truncated body: expected {expected} bytes, received {received}")]
    TruncatedBody { expected: u64, received: u64 },

    /// Underlying I/O failure unrelated to message content.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

/// Coarse failure classification, stable across error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Protocol,
    TruncatedBody,
    Transport,
}

impl FailureKind {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Protocol => "protocol",
            FailureKind::TruncatedBody => "truncated_body",
            FailureKind::Transport => "transport",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RelayError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RelayError::Protocol(_) => FailureKind::Protocol,
            RelayError::TruncatedBody { .. } => FailureKind::TruncatedBody,
            RelayError::Transport(_) => FailureKind::Transport,
        }
    }
}

/// Malformed or unsupported message head.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("source closed before any message bytes arrived")]
    EmptyMessage,

    #[error("source closed before the header block was terminated")]
    IncompleteHead,

    #[error("message head exceeded {limit} bytes")]
    HeadTooLarge { limit: usize },

    #[error("message head is not valid UTF-8")]
    InvalidEncoding,

    #[error("malformed start line: {0}")]
    MalformedStartLine(String),

    #[error("malformed header line: {0}")]
    MalformedHeader(String),

    #[error("invalid Content-Length value: {0}")]
    InvalidContentLength(String),

    #[error("conflicting Content-Length values: {first} and {second}")]
    ConflictingContentLength { first: u64, second: u64 },

    #[error("chunked transfer encoding is not supported for requests")]
    ChunkedRequest,

    #[error("expected a {expected} message")]
    UnexpectedMessageKind { expected: &'static str },

    #[error("rewritten address {0:?} is not a valid request target")]
    InvalidRewrittenAddress(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
