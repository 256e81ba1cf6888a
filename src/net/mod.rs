//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection (browser)
//!     → listener.rs (accept loop, connection limits)
//!     → server.rs (blocking worker, socket timeouts)
//!     → connection.rs (ID, live-connection tracking)
//!     → handler.rs (parse → rewrite → forward → pump response)
//!         → origin.rs (resolve + dial origin server)
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - One exchange per connection; transports closed when it ends

pub mod connection;
pub mod handler;
pub mod listener;
pub mod origin;
pub mod server;

pub use handler::{ConnectionHandler, ExchangeFailure, ExchangeState, ExchangeSummary};
pub use listener::Listener;
pub use origin::{Established, OriginDialer, TcpDialer};
pub use server::RelayServer;
