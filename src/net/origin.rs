//! Origin server transports.
//!
//! # Responsibilities
//! - Decide which origin a rewritten request is sent to
//! - Open a TCP transport with connect/read/write timeouts
//! - Accept a transport the host process already opened
//!
//! # Design Decisions
//! - Dialing happens after rewriting, so the marker never decides the origin
//! - Absolute-form addresses name their own origin; relative ones go to the
//!   configured default

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use url::Url;

use crate::config::{OriginConfig, TimeoutConfig};
use crate::http::HttpRequest;

/// Supplies the origin-facing transport for one exchange.
pub trait OriginDialer {
    type Transport: Read + Write;

    /// Open (or hand over) a transport for the already rewritten request.
    fn dial(&mut self, request: &HttpRequest) -> io::Result<Self::Transport>;
}

/// A transport opened by the caller, handed over on the first dial.
#[derive(Debug)]
pub struct Established<T>(Option<T>);

impl<T> Established<T> {
    pub fn new(transport: T) -> Self {
        Self(Some(transport))
    }
}

impl<T: Read + Write> OriginDialer for Established<T> {
    type Transport = T;

    fn dial(&mut self, _request: &HttpRequest) -> io::Result<T> {
        self.0.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "origin transport already used")
        })
    }
}

/// `host:port` the request should be sent to.
///
/// Absolute `http://` addresses use their own authority (port 80 when
/// omitted); anything else goes to `default_address`.
pub fn resolve_origin(address: &str, default_address: &str) -> String {
    match Url::parse(address) {
        Ok(url) if url.scheme() == "http" => match url.host_str() {
            Some(host) => format!("{}:{}", host, url.port_or_known_default().unwrap_or(80)),
            None => default_address.to_string(),
        },
        _ => default_address.to_string(),
    }
}

/// Dials origins over TCP.
#[derive(Debug, Clone)]
pub struct TcpDialer {
    default_address: String,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl TcpDialer {
    pub fn new(default_address: impl Into<String>) -> Self {
        Self {
            default_address: default_address.into(),
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
        }
    }

    pub fn from_config(origin: &OriginConfig, timeouts: &TimeoutConfig) -> Self {
        Self {
            default_address: origin.default_address.clone(),
            connect_timeout: secs(timeouts.connect_secs),
            read_timeout: secs(timeouts.read_secs),
            write_timeout: secs(timeouts.write_secs),
        }
    }

    pub fn default_address(&self) -> &str {
        &self.default_address
    }

    fn connect(&self, target: &str) -> io::Result<TcpStream> {
        let mut last_error = None;
        for addr in target.to_socket_addrs()? {
            let attempt = match self.connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, format!("{target} did not resolve"))
        }))
    }
}

impl OriginDialer for TcpDialer {
    type Transport = TcpStream;

    fn dial(&mut self, request: &HttpRequest) -> io::Result<TcpStream> {
        let target = resolve_origin(request.address(), &self.default_address);
        let stream = self.connect(&target)?;
        stream.set_read_timeout(self.read_timeout)?;
        stream.set_write_timeout(self.write_timeout)?;
        stream.set_nodelay(true)?;
        tracing::debug!(origin = %target, "Origin connected");
        Ok(stream)
    }
}

/// Zero means no timeout.
pub(crate) fn secs(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}
