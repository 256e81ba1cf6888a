//! Redirect-marker removal.
//!
//! Addresses handed to the browser are prefixed with a synthetic marker so
//! navigation stays on the relay's origin. A relative redirect from the real
//! server can leave that marker baked into the next request's address; this
//! operation strips it back off.

use crate::http::HttpRequest;
use crate::rewrite::chain::RequestRewrite;

/// Strips one leading occurrence of the marker from the request address.
///
/// A marker that appears anywhere other than the start is left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveRedirectMarker {
    marker: String,
}

impl RemoveRedirectMarker {
    pub const NAME: &'static str = "remove_redirect_marker";

    /// Use `marker` as the complete prefix to remove.
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Marker built from a protocol (`http://`) and server part.
    pub fn from_parts(protocol: &str, server: &str) -> Self {
        Self::new(format!("{protocol}{server}"))
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// The address with the leading marker removed, or unchanged.
    pub fn strip<'a>(&self, address: &'a str) -> &'a str {
        if self.marker.is_empty() {
            return address;
        }
        address.strip_prefix(self.marker.as_str()).unwrap_or(address)
    }
}

impl RequestRewrite for RemoveRedirectMarker {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, request: &mut HttpRequest) {
        let stripped = self.strip(request.address());
        if stripped.len() != request.address().len() {
            let stripped = stripped.to_string();
            tracing::debug!(
                from = %request.address(),
                to = %stripped,
                "Removed redirect marker"
            );
            request.set_address(stripped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "http://proxy.local/realhost.example.com";

    #[test]
    fn strips_leading_marker() {
        let op = RemoveRedirectMarker::new(MARKER);
        assert_eq!(op.strip("http://proxy.local/realhost.example.com/path"), "/path");
    }

    #[test]
    fn relative_address_is_unchanged() {
        let op = RemoveRedirectMarker::new(MARKER);
        assert_eq!(op.strip("/already/relative/path"), "/already/relative/path");
    }

    #[test]
    fn only_one_leading_occurrence_is_removed() {
        let op = RemoveRedirectMarker::new("/m");
        assert_eq!(op.strip("/m/m/x"), "/m/x");
    }

    #[test]
    fn marker_elsewhere_is_ignored() {
        let op = RemoveRedirectMarker::new(MARKER);
        let address = "/redirect?to=http://proxy.local/realhost.example.com/x";
        assert_eq!(op.strip(address), address);
    }

    #[test]
    fn parts_are_concatenated() {
        let op = RemoveRedirectMarker::from_parts("http://", "proxy.local/realhost.example.com");
        assert_eq!(op.marker(), MARKER);
    }

    #[test]
    fn empty_marker_is_a_no_op() {
        let op = RemoveRedirectMarker::new("");
        assert_eq!(op.strip("/path"), "/path");
    }
}
