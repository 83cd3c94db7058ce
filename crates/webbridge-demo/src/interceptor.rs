//! Navigation policy used by the demo: block, rewrite, or tag.

use tracing::info;
use webbridge_core::{InterceptResult, Navigator, WebRequest};

pub const INTERCEPT_HEADER: &str = "X-Intercepted";

const REWRITE_TARGET: &str = "https://httpbin.org/anything?from=interceptor&original=";

/// - any URL containing `blocked` (any case) is rejected
/// - the bare `example.com` home page is rewritten to an httpbin echo
/// - everything else loads with an extra header
pub fn demo_interceptor(request: &mut WebRequest, _navigator: &Navigator) -> InterceptResult {
    let url = request.url.clone();

    if url.to_ascii_lowercase().contains("blocked") {
        info!(url = %url, "interceptor: reject");
        return InterceptResult::Reject;
    }

    if url == "https://example.com" || url == "https://www.example.com" {
        let rewritten = format!("{REWRITE_TARGET}{}", urlencoding::encode(&url));
        info!(from = %url, to = %rewritten, "interceptor: rewrite");
        return InterceptResult::Modify(
            request
                .clone()
                .with_url(rewritten)
                .with_header(INTERCEPT_HEADER, "true"),
        );
    }

    request
        .headers
        .insert(INTERCEPT_HEADER.to_string(), "true".to_string());
    info!(url = %url, "interceptor: allow");
    InterceptResult::Allow
}
