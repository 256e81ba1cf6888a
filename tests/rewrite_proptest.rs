use std::io::{BufReader, Read};

use origin_relay::config::RewriteConfig;
use origin_relay::http::{Framing, Pump};
use origin_relay::rewrite::RemoveRedirectMarker;
use proptest::prelude::*;

fn path_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("/[a-zA-Z0-9/._?=&-]{0,40}").expect("valid path regex")
}

fn server_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9.-]{0,20}(:[1-9][0-9]{0,4})?(/[a-z0-9.-]{1,20})?")
        .expect("valid server regex")
}

proptest! {
    #[test]
    fn marker_prefix_is_removed_once(server in server_strategy(), path in path_strategy()) {
        let rewrite = RemoveRedirectMarker::from_parts("http://", &server);
        let address = format!("http://{server}{path}");
        let once = rewrite.strip(&address);
        prop_assert_eq!(once, path.as_str());
        prop_assert_eq!(rewrite.strip(once), once);
    }

    #[test]
    fn default_marker_leaves_origin_form_path(path in path_strategy()) {
        let config = RewriteConfig::default();
        let rewrite = RemoveRedirectMarker::from_parts(&config.marker_protocol, &config.marker_server);
        let address = format!("{}{path}", config.marker());
        let stripped = rewrite.strip(&address);
        prop_assert!(stripped.starts_with('/'));
        prop_assert_eq!(stripped, path.as_str());
    }

    #[test]
    fn addresses_without_leading_marker_are_untouched(server in server_strategy(), path in path_strategy()) {
        let rewrite = RemoveRedirectMarker::from_parts("http://", &server);
        prop_assert_eq!(rewrite.strip(&path), path.as_str());

        let embedded = format!("{path}?next=http://{server}");
        prop_assert_eq!(rewrite.strip(&embedded), embedded.as_str());
    }

    #[test]
    fn pump_stops_at_declared_length(
        body in proptest::collection::vec(any::<u8>(), 0..256),
        excess in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut message = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
        message.extend_from_slice(&body);
        let mut input = message.clone();
        input.extend_from_slice(&excess);

        let mut source = BufReader::new(input.as_slice());
        let mut out = Vec::new();
        let pumped = Pump::new(&mut source, &mut out).pump().expect("well-formed response");

        prop_assert_eq!(pumped.head.framing(), Framing::ExplicitLength(body.len() as u64));
        prop_assert_eq!(pumped.body_bytes, body.len() as u64);
        prop_assert_eq!(out, message);

        let mut rest = Vec::new();
        source.read_to_end(&mut rest).expect("in-memory read");
        prop_assert_eq!(rest, excess);
    }
}
