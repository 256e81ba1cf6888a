//! Forces the origin to close its side after one response.

use crate::http::HttpRequest;
use crate::rewrite::chain::RequestRewrite;

/// Sets `Connection: close` on the forwarded request.
///
/// The relay carries one exchange per connection, so keep-alive would only
/// leave a close-delimited response waiting on an origin that never closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForceConnectionClose;

impl ForceConnectionClose {
    pub const NAME: &'static str = "force_connection_close";
}

impl RequestRewrite for ForceConnectionClose {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, request: &mut HttpRequest) {
        request.headers_mut().set("Connection", "close");
    }
}
