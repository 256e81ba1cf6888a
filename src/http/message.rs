//! Parsed representation of an HTTP/1.x message head.
//!
//! # Responsibilities
//! - Read a head (start line + header block) from a buffered source
//! - Parse request lines and status lines
//! - Keep headers in arrival order with case-insensitive lookup
//! - Decide body framing once, from the headers as received
//!
//! # Design Decisions
//! - The raw head bytes are kept so they can be forwarded verbatim
//! - Header values keep their leading whitespace, so re-serialising an
//!   untouched header reproduces the original line
//! - Reading never consumes a byte past the blank line ending the head

use std::io::{self, BufRead, Read, Write};

use crate::error::{ProtocolError, RelayError};

/// Default upper bound for a message head.
pub const DEFAULT_MAX_HEAD_BYTES: usize = 64 * 1024;

/// `method SP address SP version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub address: String,
    pub version: String,
}

/// `version SP status SP reason`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: String,
    pub status: u16,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLine {
    Request(RequestLine),
    Status(StatusLine),
}

impl StartLine {
    /// Parse a start line with its line terminator already removed.
    ///
    /// A line whose first token is a protocol version is a status line;
    /// anything else must be a three-field request line.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut parts = line.split_whitespace();
        let first = parts
            .next()
            .ok_or_else(|| ProtocolError::MalformedStartLine("empty start line".into()))?;

        if first.starts_with("HTTP/") {
            if !is_http_version(first) {
                return Err(ProtocolError::MalformedStartLine(format!(
                    "invalid protocol version {first:?}"
                )));
            }
            let status_text = parts.next().ok_or_else(|| {
                ProtocolError::MalformedStartLine("status code is missing".into())
            })?;
            if status_text.len() != 3 || !status_text.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ProtocolError::MalformedStartLine(format!(
                    "invalid status code {status_text:?}"
                )));
            }
            let status = status_text.parse::<u16>().map_err(|_| {
                ProtocolError::MalformedStartLine(format!("invalid status code {status_text:?}"))
            })?;
            let reason = parts.collect::<Vec<_>>().join(" ");
            return Ok(StartLine::Status(StatusLine {
                version: first.to_string(),
                status,
                reason,
            }));
        }

        if !first.bytes().all(is_token_byte) {
            return Err(ProtocolError::MalformedStartLine(format!(
                "invalid request method {first:?}"
            )));
        }
        let address = parts
            .next()
            .ok_or_else(|| ProtocolError::MalformedStartLine("request address is missing".into()))?;
        let version = parts
            .next()
            .ok_or_else(|| ProtocolError::MalformedStartLine("protocol version is missing".into()))?;
        if !is_http_version(version) {
            return Err(ProtocolError::MalformedStartLine(format!(
                "invalid protocol version {version:?}"
            )));
        }
        if parts.next().is_some() {
            return Err(ProtocolError::MalformedStartLine(
                "request line has too many fields".into(),
            ));
        }

        Ok(StartLine::Request(RequestLine {
            method: first.to_string(),
            address: address.to_string(),
            version: version.to_string(),
        }))
    }
}

fn is_http_version(text: &str) -> bool {
    match text.strip_prefix("HTTP/").map(str::as_bytes) {
        Some([major, b'.', minor]) => major.is_ascii_digit() && minor.is_ascii_digit(),
        _ => false,
    }
}

fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&byte)
}

/// A single header line, `name:value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    name: String,
    value: String,
}

impl HeaderField {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value with surrounding whitespace removed.
    pub fn value(&self) -> &str {
        self.value.trim()
    }

    /// The value exactly as it followed the colon.
    pub fn raw_value(&self) -> &str {
        &self.value
    }
}

/// Ordered header collection.
///
/// Lookups compare names case-insensitively. Repeated names keep each
/// occurrence in arrival order; the first occurrence's casing wins when a
/// header is replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<HeaderField>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one header line with its terminator removed.
    pub fn parse_line(line: &str) -> Result<HeaderField, ProtocolError> {
        if line.starts_with(' ') || line.starts_with('\t') {
            return Err(ProtocolError::MalformedHeader(format!(
                "folded header lines are not supported: {line:?}"
            )));
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ProtocolError::MalformedHeader(format!("missing colon: {line:?}")))?;
        if name.is_empty() || !name.bytes().all(is_token_byte) {
            return Err(ProtocolError::MalformedHeader(format!(
                "invalid header name {name:?}"
            )));
        }
        Ok(HeaderField {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Append a header, keeping any existing occurrences.
    pub fn append(&mut self, name: impl Into<String>, value: impl AsRef<str>) {
        self.fields.push(HeaderField {
            name: name.into(),
            value: format!(" {}", value.as_ref()),
        });
    }

    /// Replace every occurrence of `name` with a single value.
    ///
    /// The first occurrence keeps its position and casing; when absent the
    /// header is appended with the casing given here.
    pub fn set(&mut self, name: &str, value: impl AsRef<str>) {
        let mut seen = false;
        let value = value.as_ref();
        self.fields.retain_mut(|field| {
            if !field.name.eq_ignore_ascii_case(name) {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            field.value = format!(" {value}");
            true
        });
        if !seen {
            self.append(name, value);
        }
    }

    /// First value for `name`, trimmed.
    pub fn get<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.get_all(name).next()
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |field| field.name.eq_ignore_ascii_case(name))
            .map(HeaderField::value)
    }

    /// True when any comma-separated element of `name` equals `token`.
    pub fn has_token(&self, name: &str, token: &str) -> bool {
        self.get_all(name)
            .flat_map(|value| value.split(','))
            .any(|item| item.trim().eq_ignore_ascii_case(token))
    }

    /// The declared body length, if any.
    ///
    /// Every occurrence must be a plain decimal integer and all occurrences
    /// must agree.
    pub fn content_length(&self) -> Result<Option<u64>, ProtocolError> {
        let mut length: Option<u64> = None;
        for raw in self.get_all("content-length").flat_map(|value| value.split(',')) {
            let text = raw.trim();
            if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ProtocolError::InvalidContentLength(raw.to_string()));
            }
            let parsed = text
                .parse::<u64>()
                .map_err(|_| ProtocolError::InvalidContentLength(raw.to_string()))?;
            match length {
                Some(first) if first != parsed => {
                    return Err(ProtocolError::ConflictingContentLength {
                        first,
                        second: parsed,
                    });
                }
                _ => length = Some(parsed),
            }
        }
        Ok(length)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderField> {
        self.fields.iter()
    }

    /// Write every header line followed by CRLF. The terminating blank line
    /// is not included.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        for field in &self.fields {
            sink.write_all(field.name.as_bytes())?;
            sink.write_all(b":")?;
            sink.write_all(field.value.as_bytes())?;
            sink.write_all(b"\r\n")?;
        }
        Ok(())
    }
}

/// How many body bytes belong to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    ExplicitLength(u64),
    ReadUntilClose,
}

impl Framing {
    /// Length header if present, otherwise read until the source closes.
    pub fn from_headers(headers: &Headers) -> Result<Self, ProtocolError> {
        Ok(match headers.content_length()? {
            Some(length) => Framing::ExplicitLength(length),
            None => Framing::ReadUntilClose,
        })
    }

    /// Requests never use close-delimited bodies: the browser keeps its
    /// side open while it waits for the response.
    pub fn for_request(headers: &Headers) -> Result<Self, ProtocolError> {
        if headers.has_token("transfer-encoding", "chunked") {
            return Err(ProtocolError::ChunkedRequest);
        }
        Ok(Framing::ExplicitLength(headers.content_length()?.unwrap_or(0)))
    }

    /// Responses to HEAD and 1xx/204/304 responses carry no body whatever
    /// their headers declare.
    pub fn for_response(
        status: u16,
        headers: &Headers,
        request_method: &str,
    ) -> Result<Self, ProtocolError> {
        if request_method.eq_ignore_ascii_case("HEAD")
            || (100..200).contains(&status)
            || status == 204
            || status == 304
        {
            return Ok(Framing::ExplicitLength(0));
        }
        Self::from_headers(headers)
    }
}

/// What the reader of a head knows about the exchange it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FramingContext {
    /// Nothing: length header or read-to-close.
    #[default]
    Unspecified,
    /// The message must be a request.
    Request,
    /// The message must be a response to a request with this method.
    Response { request_method: String },
}

impl FramingContext {
    pub fn response_to(request_method: impl Into<String>) -> Self {
        FramingContext::Response {
            request_method: request_method.into(),
        }
    }

    fn decide(&self, start_line: &StartLine, headers: &Headers) -> Result<Framing, ProtocolError> {
        match (self, start_line) {
            (FramingContext::Unspecified, _) => Framing::from_headers(headers),
            (FramingContext::Request, StartLine::Request(_)) => Framing::for_request(headers),
            (FramingContext::Response { request_method }, StartLine::Status(status)) => {
                Framing::for_response(status.status, headers, request_method)
            }
            (FramingContext::Request, StartLine::Status(_)) => {
                Err(ProtocolError::UnexpectedMessageKind { expected: "request" })
            }
            (FramingContext::Response { .. }, StartLine::Request(_)) => {
                Err(ProtocolError::UnexpectedMessageKind { expected: "response" })
            }
        }
    }
}

/// A parsed message head plus the framing decided for its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHead {
    raw: Vec<u8>,
    start_line: StartLine,
    headers: Headers,
    framing: Framing,
}

impl MessageHead {
    /// Read one head from `source`, stopping right after its blank line.
    pub fn read_from<R: BufRead>(
        source: &mut R,
        max_head_bytes: usize,
        context: &FramingContext,
    ) -> Result<Self, RelayError> {
        let raw = read_head_bytes(source, max_head_bytes)?;
        Ok(Self::parse(raw, context)?)
    }

    /// Parse a complete head, including its terminating blank line.
    pub fn parse(raw: Vec<u8>, context: &FramingContext) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(&raw).map_err(|_| ProtocolError::InvalidEncoding)?;
        let mut lines = text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

        let start_line = StartLine::parse(lines.next().unwrap_or_default())?;
        let mut headers = Headers::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            headers.fields.push(Headers::parse_line(line)?);
        }
        let framing = context.decide(&start_line, &headers)?;

        Ok(Self {
            raw,
            start_line,
            headers,
            framing,
        })
    }

    /// The head bytes exactly as received.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn start_line(&self) -> &StartLine {
        &self.start_line
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub(crate) fn into_parts(self) -> (StartLine, Headers, Framing) {
        (self.start_line, self.headers, self.framing)
    }
}

/// Read lines up to and including the first empty one.
///
/// Each read is capped by the remaining head budget, so an over-long head
/// fails without buffering more than `max_head_bytes`.
fn read_head_bytes<R: BufRead>(source: &mut R, max_head_bytes: usize) -> Result<Vec<u8>, RelayError> {
    let mut raw = Vec::with_capacity(1024.min(max_head_bytes));
    loop {
        let remaining = max_head_bytes.saturating_sub(raw.len());
        if remaining == 0 {
            return Err(ProtocolError::HeadTooLarge { limit: max_head_bytes }.into());
        }

        let line_start = raw.len();
        let read = source.by_ref().take(remaining as u64).read_until(b'\n', &mut raw)?;
        if read == 0 {
            let error = if raw.is_empty() {
                ProtocolError::EmptyMessage
            } else {
                ProtocolError::IncompleteHead
            };
            return Err(error.into());
        }
        if raw.last() != Some(&b'\n') {
            if raw.len() >= max_head_bytes {
                return Err(ProtocolError::HeadTooLarge { limit: max_head_bytes }.into());
            }
            return Err(ProtocolError::IncompleteHead.into());
        }

        let line = &raw[line_start..];
        if line == b"\r\n" || line == b"\n" {
            if line_start == 0 {
                return Err(ProtocolError::MalformedStartLine("empty start line".into()).into());
            }
            return Ok(raw);
        }
    }
}
