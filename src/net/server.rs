//! Relay server: accept loop plus blocking exchange workers.
//!
//! # Responsibilities
//! - Build the shared rewrite chain and handler from configuration
//! - Accept browser connections until shutdown is signalled
//! - Run each exchange on Tokio's blocking pool with socket timeouts
//! - Drain in-flight exchanges before returning
//!
//! # Design Decisions
//! - Pumps are synchronous; the async runtime only owns accepting and
//!   signals
//! - Socket read timeouts are the bound on read-to-close bodies
//! - Accept errors are logged and the loop continues

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RelayConfig;
use crate::lifecycle::ShutdownSignal;
use crate::net::connection::{ConnectionGuard, ConnectionTracker};
use crate::net::handler::ConnectionHandler;
use crate::net::listener::{ConnectionPermit, Listener};
use crate::net::origin::{secs, TcpDialer};
use crate::rewrite::{RewriteChain, UnknownOperation};

/// Accepts browser connections and relays one exchange per connection.
#[derive(Debug, Clone)]
pub struct RelayServer {
    handler: ConnectionHandler,
    dialer: TcpDialer,
    tracker: ConnectionTracker,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    drain_timeout: Duration,
}

impl RelayServer {
    /// Create a server from validated configuration.
    pub fn new(config: &RelayConfig) -> Result<Self, UnknownOperation> {
        let chain = RewriteChain::from_config(&config.rewrite)?;
        tracing::info!(
            operations = ?chain.names(),
            marker = %config.rewrite.marker(),
            origin = %config.origin.default_address,
            "Rewrite chain built"
        );
        if chain.is_empty() {
            tracing::warn!("No rewrite operations configured; requests are forwarded unchanged");
        }

        let handler = ConnectionHandler::new(Arc::new(chain))
            .with_max_head_bytes(config.limits.max_head_bytes);

        Ok(Self {
            handler,
            dialer: TcpDialer::from_config(&config.origin, &config.timeouts),
            tracker: ConnectionTracker::new(),
            read_timeout: secs(config.timeouts.read_secs),
            write_timeout: secs(config.timeouts.write_secs),
            drain_timeout: Duration::from_secs(config.timeouts.drain_secs),
        })
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Serve until `shutdown` fires, then wait for in-flight exchanges.
    pub async fn run(self, listener: Listener, mut shutdown: ShutdownSignal) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_connections = listener.max_connections(),
            "Relay server starting"
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signalled, no longer accepting");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => self.spawn_exchange(stream, peer, permit),
                    Err(e) => {
                        tracing::error!(error = %e, "Accept failed");
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                },
            }
        }
        drop(listener);

        let in_flight = self.tracker.active_count();
        if in_flight > 0 {
            tracing::info!(in_flight, "Draining connections");
        }
        if !self.tracker.wait_for_idle(self.drain_timeout).await {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Drain timeout elapsed with exchanges still in flight"
            );
        }

        tracing::info!("Relay server stopped");
        Ok(())
    }

    fn spawn_exchange(&self, stream: tokio::net::TcpStream, peer: SocketAddr, permit: ConnectionPermit) {
        let guard = self.tracker.track();
        let stream = match self.prepare_stream(stream) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(connection_id = %guard.id(), peer = %peer, error = %e, "Failed to prepare socket");
                return;
            }
        };

        let handler = self.handler.clone();
        let dialer = self.dialer.clone();
        tokio::task::spawn_blocking(move || {
            serve_connection(handler, dialer, stream, peer, guard, permit);
        });
    }

    /// Switch to a blocking std socket with the configured timeouts.
    fn prepare_stream(&self, stream: tokio::net::TcpStream) -> std::io::Result<std::net::TcpStream> {
        let stream = stream.into_std()?;
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(self.read_timeout)?;
        stream.set_write_timeout(self.write_timeout)?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

fn serve_connection(
    handler: ConnectionHandler,
    dialer: TcpDialer,
    stream: std::net::TcpStream,
    peer: SocketAddr,
    guard: ConnectionGuard,
    _permit: ConnectionPermit,
) {
    let span = tracing::info_span!("connection", connection_id = %guard.id(), peer = %peer);
    let _enter = span.enter();

    // Failures are already logged by the handler; both sockets close on drop.
    let _ = handler.handle(stream, dialer);
}
