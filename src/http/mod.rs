//! HTTP/1.x message handling subsystem.
//!
//! # Data Flow
//! ```text
//! Source byte stream
//!     → message.rs (read head, parse start line + headers, decide framing)
//!     → request.rs (mutable request for the rewrite chain)
//!     → pump.rs (verbatim head + framed body → sink byte stream)
//! ```
//!
//! # Design Decisions
//! - One message per pump; no keep-alive or chunked decoding
//! - Framing is decided once per message, before any body byte is read

pub mod message;
pub mod pump;
pub mod request;

pub use message::{Framing, FramingContext, HeaderField, Headers, MessageHead, StartLine};
pub use pump::{copy_body, Pump, Pumped};
pub use request::HttpRequest;
