//! Request rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed request (address, headers)
//!     → chain.rs (operations in registration order)
//!         → redirect_marker.rs (strip leading relay marker from the address)
//!         → connection_close.rs (one exchange per connection)
//!     → Forward to origin
//!
//! Chain Compilation (at startup):
//!     RewriteConfig.operations[]
//!     → Resolve names to operations
//!     → Freeze as immutable RewriteChain
//! ```
//!
//! # Design Decisions
//! - Requests only; responses are relayed unmodified
//! - Operations hold configuration captured at construction, never
//!   per-call state

pub mod chain;
pub mod connection_close;
pub mod redirect_marker;

pub use chain::{RequestRewrite, RewriteChain, UnknownOperation, KNOWN_OPERATIONS};
pub use connection_close::ForceConnectionClose;
pub use redirect_marker::RemoveRedirectMarker;
