//! Mutable request handed to the rewrite chain.
//!
//! # Responsibilities
//! - Expose the address field and headers for rewriting
//! - Carry the body framing decided when the head was read
//! - Serialise the (possibly rewritten) head for forwarding
//!
//! # Design Decisions
//! - Framing is fixed at parse time; rewrites cannot change how many body
//!   bytes are relayed
//! - The original address is kept for logging

use std::io::{self, Write};

use crate::error::ProtocolError;
use crate::http::message::{Framing, Headers, MessageHead, StartLine};

/// A parsed request whose address may be rewritten before forwarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: String,
    address: String,
    original_address: String,
    version: String,
    headers: Headers,
    framing: Framing,
}

impl HttpRequest {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    /// The address as the browser sent it, before any rewrite.
    pub fn original_address(&self) -> &str {
        &self.original_address
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Check that the current address can still be sent as a request target:
    /// origin-form (`/...`), absolute `http://` form, or `*`.
    pub fn check_address(&self) -> Result<(), ProtocolError> {
        let address = self.address.as_str();
        let well_formed = address == "*"
            || address.starts_with('/')
            || address.starts_with("http://");
        if !well_formed || address.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
            return Err(ProtocolError::InvalidRewrittenAddress(address.to_string()));
        }
        Ok(())
    }

    /// Write the request line, headers and blank line.
    pub fn write_head<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        write!(sink, "{} {} {}\r\n", self.method, self.address, self.version)?;
        self.headers.write_to(sink)?;
        sink.write_all(b"\r\n")
    }

    pub fn head_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_head(&mut out);
        out
    }
}

impl TryFrom<MessageHead> for HttpRequest {
    type Error = ProtocolError;

    fn try_from(head: MessageHead) -> Result<Self, Self::Error> {
        let (start_line, headers, framing) = head.into_parts();
        match start_line {
            StartLine::Request(line) => Ok(Self {
                method: line.method,
                original_address: line.address.clone(),
                address: line.address,
                version: line.version,
                headers,
                framing,
            }),
            StartLine::Status(_) => Err(ProtocolError::UnexpectedMessageKind { expected: "request" }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::message::FramingContext;

    fn request(raw: &str) -> HttpRequest {
        let head = MessageHead::parse(raw.as_bytes().to_vec(), &FramingContext::Request).unwrap();
        HttpRequest::try_from(head).unwrap()
    }

    #[test]
    fn untouched_request_serialises_to_its_input() {
        let raw = "GET /a?b=c HTTP/1.1\r\nHost: example.com\r\nAccept:*/*\r\n\r\n";
        assert_eq!(request(raw).head_bytes(), raw.as_bytes());
    }

    #[test]
    fn rewritten_address_is_forwarded() {
        let mut req = request("GET http://relay/x HTTP/1.0\r\n\r\n");
        req.set_address("/x");
        assert_eq!(req.head_bytes(), b"GET /x HTTP/1.0\r\n\r\n");
        assert_eq!(req.original_address(), "http://relay/x");
    }

    #[test]
    fn request_targets_are_checked_after_rewriting() {
        let mut req = request("OPTIONS * HTTP/1.1\r\n\r\n");
        assert!(req.check_address().is_ok());

        req.set_address("http://app.example.com/x");
        assert!(req.check_address().is_ok());

        for bad in ["", "page.html", "/a b", "https://secure/x"] {
            req.set_address(bad);
            assert_eq!(
                req.check_address(),
                Err(ProtocolError::InvalidRewrittenAddress(bad.to_string()))
            );
        }
    }

    #[test]
    fn status_line_is_not_a_request() {
        let head =
            MessageHead::parse(b"HTTP/1.1 200 OK\r\n\r\n".to_vec(), &FramingContext::Unspecified)
                .unwrap();
        assert!(HttpRequest::try_from(head).is_err());
    }
}
