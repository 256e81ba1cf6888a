//! Same-origin HTTP relay for browser-driven test automation.
//!
//! The relay sits between a browser and the application under test so that
//! all traffic appears to come from one origin. Each browser connection
//! carries one exchange: the request is parsed, rewritten by an ordered
//! chain of operations (stripping the relay's redirect marker from the
//! address), forwarded to the origin server, and the origin's response is
//! pumped back unmodified.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod rewrite;

pub use config::RelayConfig;
pub use error::{FailureKind, ProtocolError, RelayError};
pub use http::{Framing, Pump};
pub use lifecycle::Shutdown;
pub use net::{ConnectionHandler, RelayServer};
pub use rewrite::{RemoveRedirectMarker, RequestRewrite, RewriteChain};
