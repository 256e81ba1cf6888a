//! End-to-end relay tests over real sockets.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use origin_relay::config::RelayConfig;
use origin_relay::lifecycle::Shutdown;
use origin_relay::net::{Listener, RelayServer};

mod common;

const MARKER_SERVER: &str = "proxy.local/realhost.example.com";

async fn start_relay(origin: SocketAddr) -> (SocketAddr, Shutdown, tokio::task::JoinHandle<()>) {
    start_relay_with(origin, |_| {}).await
}

async fn start_relay_with(
    origin: SocketAddr,
    configure: impl FnOnce(&mut RelayConfig),
) -> (SocketAddr, Shutdown, tokio::task::JoinHandle<()>) {
    let mut config = RelayConfig::default();
    config.origin.default_address = origin.to_string();
    config.rewrite.marker_server = MARKER_SERVER.to_string();
    config.timeouts.read_secs = 5;
    config.timeouts.drain_secs = 2;
    configure(&mut config);

    let server = RelayServer::new(&config).unwrap();
    let tokio_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listener = Listener::from_tokio(tokio_listener, 8);
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        server.run(listener, signal).await.unwrap();
    });
    (addr, shutdown, handle)
}

#[tokio::test(flavor = "multi_thread")]
async fn marker_is_stripped_before_forwarding() {
    let (origin, recorded) =
        common::start_mock_origin(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");
    let (relay, shutdown, handle) = start_relay(origin).await;

    let response = tokio::task::spawn_blocking(move || {
        common::browser_exchange(
            relay,
            b"GET http://proxy.local/realhost.example.com/page?q=1 HTTP/1.1\r\nHost: proxy.local\r\nConnection: keep-alive\r\n\r\n",
        )
    })
    .await
    .unwrap();

    assert_eq!(response, b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");

    let head = recorded.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(
        head,
        b"GET /page?q=1 HTTP/1.1\r\nHost: proxy.local\r\nConnection: close\r\n\r\n"
    );

    shutdown.trigger();
    handle.await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn close_delimited_response_is_relayed_whole() {
    let (origin, _recorded) =
        common::start_mock_origin(b"HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\nuntil the origin closes");
    let (relay, shutdown, handle) = start_relay(origin).await;

    let response = tokio::task::spawn_blocking(move || {
        common::browser_exchange(relay, b"GET /stream HTTP/1.0\r\n\r\n")
    })
    .await
    .unwrap();

    assert_eq!(
        response,
        b"HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\nuntil the origin closes"
    );

    shutdown.trigger();
    handle.await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_request_closes_without_response() {
    let (origin, recorded) = common::start_mock_origin(b"HTTP/1.1 200 OK\r\n\r\n");
    let (relay, shutdown, handle) = start_relay(origin).await;

    let response = tokio::task::spawn_blocking(move || {
        common::browser_exchange(relay, b"GET /missing-version\r\n\r\n")
    })
    .await
    .unwrap();

    assert!(response.is_empty());
    assert!(recorded.recv_timeout(Duration::from_millis(300)).is_err());

    shutdown.trigger();
    handle.await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_origin_closes_browser_connection() {
    // Bind then drop to get a port nothing listens on.
    let origin = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let (relay, shutdown, handle) = start_relay(origin).await;

    let response = tokio::task::spawn_blocking(move || {
        common::browser_exchange(relay, b"GET / HTTP/1.1\r\nHost: x\r\n\r\n")
    })
    .await
    .unwrap();

    assert!(response.is_empty());

    shutdown.trigger();
    handle.await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn stalled_close_delimited_body_times_out_and_closes_browser() {
    let head: &'static [u8] = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n";
    let origin = common::start_stalling_origin(head, Duration::from_secs(8));
    let (relay, shutdown, handle) = start_relay_with(origin, |config| {
        config.timeouts.read_secs = 1;
    })
    .await;

    let (outcome, elapsed) = tokio::task::spawn_blocking(move || {
        let mut socket = TcpStream::connect(relay).unwrap();
        socket.set_read_timeout(Some(Duration::from_secs(6))).unwrap();
        socket.write_all(b"GET /slow HTTP/1.1\r\n\r\n").unwrap();

        let started = Instant::now();
        let mut response = Vec::new();
        let outcome = socket.read_to_end(&mut response).map(|_| response);
        (outcome, started.elapsed())
    })
    .await
    .unwrap();

    // The relay closed the browser side itself, long before the origin would.
    let response = outcome.expect("relay should close the browser connection");
    assert_eq!(response, head);
    assert!(elapsed < Duration::from_secs(6));

    shutdown.trigger();
    handle.await.unwrap();
}
