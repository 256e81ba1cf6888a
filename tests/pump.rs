//! Pump behaviour against in-memory streams.

use std::io::{BufReader, Read};

use origin_relay::error::{ProtocolError, RelayError};
use origin_relay::http::Pump;

#[test]
fn pumps_only_declared_length() {
    let data = "HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\nthis";
    let excess = " but not this";
    let input = format!("{data}{excess}");
    let mut source = BufReader::new(input.as_bytes());
    let mut out = Vec::new();

    Pump::new(&mut source, &mut out).pump().unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), data);
    let mut rest = String::new();
    source.read_to_string(&mut rest).unwrap();
    assert_eq!(rest, excess);
}

#[test]
fn pumps_until_end_without_length() {
    let data = "HTTP/1.1 200 OK\r\n\r\nthis";
    let mut source = BufReader::new(data.as_bytes());
    let mut out = Vec::new();

    Pump::new(&mut source, &mut out).pump().unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), data);
    let mut byte = [0_u8; 1];
    assert_eq!(source.read(&mut byte).unwrap(), 0);
}

#[test]
fn head_is_forwarded_verbatim_in_both_framings() {
    let heads = [
        "HTTP/1.1 200 OK\r\nx-lower: a\r\nX-UPPER:b\r\nContent-Length:  0 \r\n\r\n",
        "HTTP/1.1  301  Moved   Permanently\r\nLocation: /elsewhere\r\n\r\n",
    ];
    for head in heads {
        let mut source = head.as_bytes();
        let mut out = Vec::new();
        Pump::new(&mut source, &mut out).pump().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), head);
    }
}

#[test]
fn missing_protocol_version_is_protocol_error() {
    let mut source: &[u8] = b"GET /index.html\r\nContent-Length: 4\r\n\r\nbody";
    let mut out = Vec::new();

    let err = Pump::new(&mut source, &mut out).pump().unwrap_err();

    assert!(matches!(
        err,
        RelayError::Protocol(ProtocolError::MalformedStartLine(_))
    ));
    assert!(out.is_empty());
}

#[test]
fn declared_length_beyond_close_is_truncated() {
    let mut source: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort";
    let mut out = Vec::new();

    let err = Pump::new(&mut source, &mut out).pump().unwrap_err();

    match err {
        RelayError::TruncatedBody { expected, received } => {
            assert_eq!(expected, 100);
            assert_eq!(received, 5);
        }
        other => panic!("expected truncated body, got {other:?}"),
    }
}
