use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};
use wry::WebViewBuilder;

use crate::content::ContentProvider;
use crate::events::EngineSignal;
use crate::navigator::Navigator;
use crate::request::{Headers, WebRequest};

use super::{Inbox, ASSET_SCHEME};

fn with_inbox(inbox: &Mutex<Inbox>, f: impl FnOnce(&mut Inbox)) {
    f(&mut inbox.lock().unwrap_or_else(PoisonError::into_inner));
}

pub(super) fn attach_ipc_handler<'a>(
    builder: WebViewBuilder<'a>,
    inbox: Arc<Mutex<Inbox>>,
) -> WebViewBuilder<'a> {
    builder.with_ipc_handler(move |request| {
        let body = request.body().to_string();
        debug!(body_len = body.len(), "page message");
        with_inbox(&inbox, |inbox| inbox.messages.push_back(body));
    })
}

pub(super) fn attach_page_load_handler<'a>(
    builder: WebViewBuilder<'a>,
    inbox: Arc<Mutex<Inbox>>,
) -> WebViewBuilder<'a> {
    builder.with_on_page_load_handler(move |event, url| {
        debug!(?event, url = %url, "page load");
        with_inbox(&inbox, |inbox| match event {
            wry::PageLoadEvent::Started => {
                inbox.signals.push(EngineSignal::PageStarted { url: Some(url) });
            }
            wry::PageLoadEvent::Finished => {
                inbox.history.visit(&url);
                let signal = EngineSignal::NavigabilityChanged {
                    can_go_back: inbox.history.can_go_back(),
                    can_go_forward: inbox.history.can_go_forward(),
                };
                inbox.signals.push(signal);
                inbox.signals.push(EngineSignal::PageFinished { url: Some(url) });
            }
        });
    })
}

pub(super) fn attach_title_handler<'a>(
    builder: WebViewBuilder<'a>,
    inbox: Arc<Mutex<Inbox>>,
) -> WebViewBuilder<'a> {
    builder.with_document_title_changed_handler(move |title| {
        debug!(title = %title, "title changed");
        let title = Some(title).filter(|t| !t.trim().is_empty());
        with_inbox(&inbox, |inbox| {
            inbox.signals.push(EngineSignal::TitleChanged { title });
        });
    })
}

/// Every top-level navigation, programmatic or page-initiated, is put to
/// the navigator's interceptor before the engine proceeds.
pub(super) fn attach_navigation_handler<'a>(
    builder: WebViewBuilder<'a>,
    navigator: Navigator,
) -> WebViewBuilder<'a> {
    builder.with_navigation_handler(move |url| {
        let proceed =
            navigator.intercept_engine_navigation(WebRequest::navigation(url.clone(), Headers::new()));
        if !proceed {
            debug!(url = %url, "navigation cancelled");
        }
        proceed
    })
}

pub(super) fn attach_asset_protocol<'a>(
    builder: WebViewBuilder<'a>,
    provider: Arc<ContentProvider>,
) -> WebViewBuilder<'a> {
    builder.with_custom_protocol(ASSET_SCHEME.to_string(), move |_wv_id, request| {
        let uri = request.uri().to_string();
        let path = asset_path(&uri);

        let response = match provider.resolve_asset(path) {
            Some((mime, data)) => wry::http::Response::builder()
                .status(200)
                .header("Content-Type", mime.as_ref())
                .body(std::borrow::Cow::from(data.into_owned())),
            None => {
                warn!(path = %path, "asset protocol: not found");
                wry::http::Response::builder()
                    .status(404)
                    .body(std::borrow::Cow::from(b"Not Found".to_vec()))
            }
        };
        response.unwrap_or_else(|e| {
            warn!(error = %e, "asset protocol: bad response");
            wry::http::Response::new(std::borrow::Cow::from(Vec::new()))
        })
    })
}

/// Strip the scheme and host from an asset URL.
fn asset_path(uri: &str) -> &str {
    let rest = uri
        .strip_prefix(ASSET_SCHEME)
        .and_then(|r| r.strip_prefix("://"))
        .unwrap_or(uri);
    rest.strip_prefix("localhost").unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_path_strips_scheme_and_host() {
        assert_eq!(asset_path("webbridge://localhost/index.html"), "/index.html");
        assert_eq!(asset_path("webbridge:///app/main.js"), "/app/main.js");
        assert_eq!(asset_path("/plain.css"), "/plain.css");
    }
}
