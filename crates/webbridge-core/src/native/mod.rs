//! Engine binding backed by a native wry WebView.
//!
//! The WebView is thread-bound: create the engine, attach it to a session
//! and pump that session on the thread that owns the window. Native
//! callbacks only append to an inbox the session drains on each pump.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use webbridge_common::EngineError;
use webbridge_config::EngineConfig;
use wry::raw_window_handle;
use wry::{WebView, WebViewBuilder};

use crate::bootstrap::MessageTransport;
use crate::content::{ContentProvider, FileSource, HtmlData};
use crate::engine::EngineBinding;
use crate::events::EngineSignal;
use crate::history::HistoryTracker;
use crate::navigator::{Navigator, ScriptCallback};
use crate::request::Headers;

mod handlers;

/// Custom scheme serving [`ContentProvider`] assets,
/// e.g. `webbridge://localhost/index.html`.
pub const ASSET_SCHEME: &str = "webbridge";

#[derive(Default)]
pub(crate) struct Inbox {
    signals: Vec<EngineSignal>,
    messages: VecDeque<String>,
    history: HistoryTracker,
}

pub struct WryEngine {
    webview: WebView,
    inbox: Arc<Mutex<Inbox>>,
    content: Arc<ContentProvider>,
}

impl WryEngine {
    /// Create a WebView as a child of `window`, positioned at `bounds`.
    pub fn create<W: raw_window_handle::HasWindowHandle>(
        window: &W,
        bounds: wry::Rect,
        config: &EngineConfig,
        navigator: &Navigator,
        content: ContentProvider,
    ) -> Result<Self, EngineError> {
        let inbox = Arc::new(Mutex::new(Inbox::default()));
        let content = Arc::new(content);

        let mut builder = WebViewBuilder::new()
            .with_bounds(bounds)
            .with_transparent(config.transparent)
            .with_devtools(config.devtools)
            .with_clipboard(config.clipboard)
            .with_autoplay(config.autoplay)
            .with_focused(false)
            .with_url("about:blank");

        if let Some(ua) = &config.user_agent {
            builder = builder.with_user_agent(ua);
        }

        builder = handlers::attach_ipc_handler(builder, Arc::clone(&inbox));
        builder = handlers::attach_page_load_handler(builder, Arc::clone(&inbox));
        builder = handlers::attach_title_handler(builder, Arc::clone(&inbox));
        builder = handlers::attach_navigation_handler(builder, navigator.clone());
        builder = handlers::attach_asset_protocol(builder, Arc::clone(&content));

        let webview = builder.build_as_child(window).map_err(native)?;
        debug!(assets = %content.base_dir().display(), "wry engine created");

        Ok(Self {
            webview,
            inbox,
            content,
        })
    }

    pub fn set_bounds(&self, bounds: wry::Rect) -> Result<(), EngineError> {
        self.webview.set_bounds(bounds).map_err(native)
    }

    pub fn set_visible(&self, visible: bool) -> Result<(), EngineError> {
        self.webview.set_visible(visible).map_err(native)
    }

    pub fn open_devtools(&self) {
        self.webview.open_devtools();
    }

    /// The underlying wry WebView.
    pub fn inner(&self) -> &WebView {
        &self.webview
    }

    fn inbox(&self) -> MutexGuard<'_, Inbox> {
        self.inbox.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_script(&self, script: &str) -> Result<(), EngineError> {
        self.webview
            .evaluate_script(script)
            .map_err(|e| EngineError::Script(e.to_string()))
    }
}

fn native(e: wry::Error) -> EngineError {
    EngineError::Native(e.to_string())
}

fn header_map(headers: &Headers) -> Result<wry::http::HeaderMap, EngineError> {
    let mut map = wry::http::HeaderMap::new();
    for (name, value) in headers {
        let name = wry::http::header::HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| EngineError::Load(format!("header name {name:?}: {e}")))?;
        let value = wry::http::header::HeaderValue::from_str(value)
            .map_err(|e| EngineError::Load(format!("header value {value:?}: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

impl EngineBinding for WryEngine {
    fn load_url(&self, url: &str, headers: &Headers) -> Result<(), EngineError> {
        if headers.is_empty() {
            self.webview.load_url(url).map_err(native)
        } else {
            self.webview
                .load_url_with_headers(url, header_map(headers)?)
                .map_err(native)
        }
    }

    fn load_html(&self, data: &HtmlData) -> Result<(), EngineError> {
        if data.base_url.is_some() || data.history_url.is_some() {
            debug!("wry ignores base and history URLs for inline HTML");
        }
        self.webview.load_html(&data.html).map_err(native)
    }

    fn load_file(&self, path: &str, source: FileSource) -> Result<(), EngineError> {
        let html = self.content.load_html_file(path, source);
        self.webview.load_html(&html).map_err(native)
    }

    fn go_back(&self) -> Result<(), EngineError> {
        self.run_script("history.back();")
    }

    fn go_forward(&self) -> Result<(), EngineError> {
        self.run_script("history.forward();")
    }

    fn reload(&self) -> Result<(), EngineError> {
        self.run_script("location.reload();")
    }

    fn stop_loading(&self) -> Result<(), EngineError> {
        self.run_script("window.stop();")
    }

    fn evaluate_script(
        &self,
        script: &str,
        callback: Option<ScriptCallback>,
    ) -> Result<(), EngineError> {
        let Some(callback) = callback else {
            return self.run_script(script);
        };
        // wry wants a reusable closure; the result is delivered once.
        let slot = Mutex::new(Some(callback));
        self.webview
            .evaluate_script_with_callback(script, move |result| {
                let callback = slot
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                if let Some(callback) = callback {
                    callback(result);
                }
            })
            .map_err(|e| EngineError::Script(e.to_string()))
    }

    fn can_go_back(&self) -> bool {
        self.inbox().history.can_go_back()
    }

    fn can_go_forward(&self) -> bool {
        self.inbox().history.can_go_forward()
    }

    fn message_transport(&self) -> MessageTransport {
        MessageTransport::Ipc
    }

    fn reports_programmatic_navigations(&self) -> bool {
        true
    }

    fn take_signals(&mut self) -> Vec<EngineSignal> {
        std::mem::take(&mut self.inbox().signals)
    }

    fn drain_ipc_messages(&mut self) -> Vec<String> {
        self.inbox().messages.drain(..).collect()
    }
}
