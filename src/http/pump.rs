//! Framing-aware relay of a single HTTP message.
//!
//! # Responsibilities
//! - Forward the head verbatim (casing, ordering and whitespace preserved)
//! - Decide framing once from the headers as received
//! - Copy exactly the body bytes that belong to the message
//!
//! # Design Decisions
//! - The head is parsed before any byte reaches the sink, so a malformed head
//!   forwards nothing
//! - Body copying works on the source's own buffer (`fill_buf`/`consume`) and
//!   never reads past the declared length
//! - The sink is flushed after every chunk; on failure everything written so
//!   far has already been delivered
//! - One message per call, no retries

use std::io::{self, BufRead, Write};

use crate::error::{RelayError, Result};
use crate::http::message::{Framing, FramingContext, MessageHead, DEFAULT_MAX_HEAD_BYTES};

/// Outcome of a successful pump.
#[derive(Debug, Clone)]
pub struct Pumped {
    /// The head that was forwarded.
    pub head: MessageHead,
    /// Body bytes written to the sink.
    pub body_bytes: u64,
}

/// One-shot relay of one message from `source` to `sink`.
#[derive(Debug)]
pub struct Pump<R, W> {
    source: R,
    sink: W,
    context: FramingContext,
    max_head_bytes: usize,
}

impl<R: BufRead, W: Write> Pump<R, W> {
    /// Create a pump with the plain framing rule: length header, else read
    /// until the source closes.
    pub fn new(source: R, sink: W) -> Self {
        Self {
            source,
            sink,
            context: FramingContext::Unspecified,
            max_head_bytes: DEFAULT_MAX_HEAD_BYTES,
        }
    }

    pub fn with_context(mut self, context: FramingContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_max_head_bytes(mut self, max_head_bytes: usize) -> Self {
        self.max_head_bytes = max_head_bytes;
        self
    }

    /// Relay one message.
    pub fn pump(&mut self) -> Result<Pumped> {
        let head = MessageHead::read_from(&mut self.source, self.max_head_bytes, &self.context)?;

        self.sink.write_all(head.raw())?;
        self.sink.flush()?;

        let body_bytes = copy_body(&mut self.source, &mut self.sink, head.framing())?;

        tracing::trace!(
            head_bytes = head.raw().len(),
            body_bytes,
            framing = ?head.framing(),
            "Message pumped"
        );

        Ok(Pumped { head, body_bytes })
    }
}

/// Copy a message body according to `framing`, returning the byte count.
///
/// For `ExplicitLength(n)` the source closing before `n` bytes is a
/// [`RelayError::TruncatedBody`].
pub fn copy_body<R, W>(source: &mut R, sink: &mut W, framing: Framing) -> Result<u64>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    let limit = match framing {
        Framing::ExplicitLength(length) => Some(length),
        Framing::ReadUntilClose => None,
    };

    let mut copied = 0_u64;
    loop {
        if limit == Some(copied) {
            break;
        }

        let available = match source.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(RelayError::Transport(e)),
        };
        if available.is_empty() {
            break;
        }

        let take = match limit {
            Some(length) => available.len().min(usize::try_from(length - copied).unwrap_or(usize::MAX)),
            None => available.len(),
        };
        if let Err(e) = sink.write_all(&available[..take]).and_then(|_| sink.flush()) {
            return Err(RelayError::Transport(e));
        }
        source.consume(take);
        copied += take as u64;
    }

    match limit {
        Some(expected) if copied < expected => Err(RelayError::TruncatedBody {
            expected,
            received: copied,
        }),
        _ => Ok(copied),
    }
}
