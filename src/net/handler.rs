//! Per-connection exchange orchestration.
//!
//! # State Machine
//! ```text
//! Start → ParseRequest → ApplyRewrites → Forward → PumpResponse → Done
//!   └──────────┴──────────────┴────────────┴───────────┴──→ Failed
//! ```
//!
//! # Design Decisions
//! - Exactly one exchange per connection
//! - The request is fully parsed and rewritten before the origin is dialed,
//!   so a malformed request never reaches the origin
//! - Both transports are owned here and dropped (closed) when the exchange
//!   ends, successfully or not
//! - No retries; the accept loop decides what happens next

use std::io::{BufReader, Read, Write};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

use crate::error::RelayError;
use crate::http::message::DEFAULT_MAX_HEAD_BYTES;
use crate::http::{copy_body, FramingContext, HttpRequest, MessageHead, Pump, StartLine};
use crate::net::origin::{Established, OriginDialer};
use crate::observability::metrics::{self, Direction};
use crate::rewrite::RewriteChain;

/// Stage of a relayed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Start,
    ParseRequest,
    ApplyRewrites,
    Forward,
    PumpResponse,
    Done,
    Failed,
}

impl ExchangeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExchangeState::Done | ExchangeState::Failed)
    }
}

/// A failed exchange and the stage it failed in.
#[derive(Debug, Error)]
#[error("exchange failed during {state:?}: {error}")]
pub struct ExchangeFailure {
    pub state: ExchangeState,
    #[source]
    pub error: RelayError,
}

fn failed_at<E: Into<RelayError>>(state: ExchangeState) -> impl FnOnce(E) -> ExchangeFailure {
    move |error| ExchangeFailure {
        state,
        error: error.into(),
    }
}

/// What a completed exchange relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeSummary {
    pub exchange_id: Uuid,
    pub method: String,
    pub original_address: String,
    pub forwarded_address: String,
    pub status: Option<u16>,
    pub request_body_bytes: u64,
    pub response_body_bytes: u64,
}

/// Relays one exchange per connection through the rewrite chain.
///
/// Cheap to clone; the chain is shared, never mutated.
#[derive(Debug, Clone)]
pub struct ConnectionHandler {
    chain: Arc<RewriteChain>,
    max_head_bytes: usize,
}

impl ConnectionHandler {
    pub fn new(chain: Arc<RewriteChain>) -> Self {
        Self {
            chain,
            max_head_bytes: DEFAULT_MAX_HEAD_BYTES,
        }
    }

    pub fn with_max_head_bytes(mut self, max_head_bytes: usize) -> Self {
        self.max_head_bytes = max_head_bytes;
        self
    }

    /// Relay between a browser-facing and an already open origin-facing
    /// transport.
    pub fn relay<B, O>(&self, browser: B, origin: O) -> Result<ExchangeSummary, ExchangeFailure>
    where
        B: Read + Write,
        O: Read + Write,
    {
        self.handle(browser, Established::new(origin))
    }

    /// Relay one exchange, opening the origin transport through `dialer`
    /// once the request has been rewritten.
    pub fn handle<B, D>(&self, browser: B, mut dialer: D) -> Result<ExchangeSummary, ExchangeFailure>
    where
        B: Read + Write,
        D: OriginDialer,
    {
        let exchange_id = Uuid::new_v4();
        let span = tracing::info_span!("exchange", %exchange_id);
        let _enter = span.enter();
        let start_time = Instant::now();

        let result = self.run(exchange_id, browser, &mut dialer);
        match &result {
            Ok(summary) => {
                metrics::record_exchange_ok(start_time);
                tracing::info!(
                    method = %summary.method,
                    address = %summary.original_address,
                    forwarded = %summary.forwarded_address,
                    status = summary.status,
                    request_bytes = summary.request_body_bytes,
                    response_bytes = summary.response_body_bytes,
                    elapsed = ?start_time.elapsed(),
                    "Exchange relayed"
                );
            }
            Err(failure) => {
                tracing::trace!(from = ?failure.state, to = ?ExchangeState::Failed, "Exchange state");
                metrics::record_exchange_failed(failure.error.kind(), start_time);
                tracing::warn!(
                    state = ?failure.state,
                    kind = %failure.error.kind(),
                    error = %failure.error,
                    "Exchange failed"
                );
            }
        }
        result
    }

    fn run<B, D>(
        &self,
        exchange_id: Uuid,
        browser: B,
        dialer: &mut D,
    ) -> Result<ExchangeSummary, ExchangeFailure>
    where
        B: Read + Write,
        D: OriginDialer,
    {
        let mut state = ExchangeState::Start;
        let mut browser = BufReader::new(browser);

        advance(&mut state, ExchangeState::ParseRequest);
        let head = MessageHead::read_from(&mut browser, self.max_head_bytes, &FramingContext::Request)
            .map_err(failed_at(state))?;
        let mut request = HttpRequest::try_from(head).map_err(failed_at(state))?;

        advance(&mut state, ExchangeState::ApplyRewrites);
        self.chain.apply(&mut request);
        request.check_address().map_err(failed_at(state))?;

        advance(&mut state, ExchangeState::Forward);
        let origin = dialer.dial(&request).map_err(failed_at(state))?;
        let mut origin = BufReader::new(origin);
        {
            let sink = origin.get_mut();
            sink.write_all(&request.head_bytes())
                .and_then(|_| sink.flush())
                .map_err(failed_at(state))?;
        }
        let request_body_bytes =
            copy_body(&mut browser, origin.get_mut(), request.framing()).map_err(failed_at(state))?;
        metrics::record_body_bytes(Direction::Upstream, request_body_bytes);

        advance(&mut state, ExchangeState::PumpResponse);
        let pumped = Pump::new(&mut origin, browser.get_mut())
            .with_context(FramingContext::response_to(request.method()))
            .with_max_head_bytes(self.max_head_bytes)
            .pump()
            .map_err(failed_at(state))?;
        metrics::record_body_bytes(Direction::Downstream, pumped.body_bytes);

        advance(&mut state, ExchangeState::Done);
        let status = match pumped.head.start_line() {
            StartLine::Status(line) => Some(line.status),
            StartLine::Request(_) => None,
        };

        Ok(ExchangeSummary {
            exchange_id,
            method: request.method().to_string(),
            original_address: request.original_address().to_string(),
            forwarded_address: request.address().to_string(),
            status,
            request_body_bytes,
            response_body_bytes: pumped.body_bytes,
        })
    }
}

fn advance(state: &mut ExchangeState, next: ExchangeState) {
    debug_assert!(!state.is_terminal(), "exchange already finished");
    tracing::trace!(from = ?state, to = ?next, "Exchange state");
    *state = next;
}
