//! Shared utilities for integration tests.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Start a one-shot origin that records the request head it receives and
/// answers with `response`, then closes.
///
/// Returns the origin address and a receiver for the recorded head.
#[allow(dead_code)]
pub fn start_mock_origin(response: &'static [u8]) -> (SocketAddr, mpsc::Receiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        if let Ok((mut socket, _)) = listener.accept() {
            socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
            let head = read_head(&mut socket);
            let _ = tx.send(head);
            let _ = socket.write_all(response);
            let _ = socket.flush();
        }
    });

    (addr, rx)
}

/// Start a one-shot origin that answers with `head` and then holds the
/// connection open for `hold` without sending anything more.
#[allow(dead_code)]
pub fn start_stalling_origin(head: &'static [u8], hold: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        if let Ok((mut socket, _)) = listener.accept() {
            socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
            read_head(&mut socket);
            let _ = socket.write_all(head);
            let _ = socket.flush();
            thread::sleep(hold);
        }
    });

    addr
}

/// Read bytes until the blank line ending a message head.
#[allow(dead_code)]
pub fn read_head(socket: &mut TcpStream) -> Vec<u8> {
    let mut head = Vec::new();
    let mut byte = [0_u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match socket.read(&mut byte) {
            Ok(0) | Err(_) => break,
            Ok(_) => head.push(byte[0]),
        }
    }
    head
}

/// Send `request` to the relay and read everything until it closes.
#[allow(dead_code)]
pub fn browser_exchange(relay: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut socket = TcpStream::connect(relay).unwrap();
    socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    socket.write_all(request).unwrap();
    let mut response = Vec::new();
    let _ = socket.read_to_end(&mut response);
    response
}
