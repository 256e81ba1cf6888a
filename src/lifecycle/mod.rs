//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Apply CLI overrides → Validate → Init logging/metrics
//!     → Build rewrite chain → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Shutdown has timeout: exit after `drain_secs` even with exchanges in flight

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
