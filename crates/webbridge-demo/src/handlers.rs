//! Page-callable methods registered by the demo.
//!
//! | method       | params                    | reply                   |
//! |--------------|---------------------------|-------------------------|
//! | `echo`       | `{text}` or any text      | the text                |
//! | `appInfo`    | none                      | `{os, arch, version}`   |
//! | `navigate`   | `{url}`                   | none                    |
//! | `setCookie`  | `{url, name?, value?}`    | `ok`                    |
//! | `getCookies` | `{url}`                   | `[cookie; ...]`         |
//! | `custom`     | anything                  | the params verbatim     |
//! | `getConfig`  | none                      | effective config JSON   |
//!
//! The cookie methods answer from a spawned task, the way a handler backed
//! by real engine storage would.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};
use url::Url;
use webbridge_config::BridgeConfig;
use webbridge_core::{
    Cookie, CookieManager, Headers, JsBridge, JsMessage, JsMessageHandler, Navigator, Reply,
    SameSite,
};

/// Add `https://` to scheme-less input. Blank input means `about:blank`.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "about:blank".to_string();
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }
    format!("https://{trimmed}")
}

fn host_from_url(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

/// Register every demo method on `bridge`. Asynchronous replies run on
/// `tasks` so the caller can wait for them.
pub fn register_all(
    bridge: &JsBridge,
    config: &BridgeConfig,
    cookies: Arc<dyn CookieManager>,
    tasks: TaskTracker,
) {
    bridge.register(EchoHandler);
    bridge.register(AppInfoHandler);
    bridge.register(NavigateHandler);
    bridge.register(SetCookieHandler {
        cookies: Arc::clone(&cookies),
        tasks: tasks.clone(),
    });
    bridge.register(GetCookiesHandler { cookies, tasks });
    bridge.register(CustomHandler);
    bridge.register(GetConfigHandler {
        config_json: webbridge_config::config_to_json(config),
    });
    info!(count = bridge.handler_count(), "demo handlers registered");
}

pub struct EchoHandler;

impl JsMessageHandler for EchoHandler {
    fn method_name(&self) -> &str {
        "echo"
    }

    fn handle(&self, message: &JsMessage, _navigator: &Navigator, reply: Reply) {
        let text = message
            .param_str("text")
            .unwrap_or_else(|| message.params.clone());
        info!(text = %preview(&text, 120), "jsbridge: echo");
        reply.send(text);
    }
}

#[derive(Serialize)]
struct AppInfo {
    os: &'static str,
    arch: &'static str,
    version: &'static str,
}

pub struct AppInfoHandler;

impl JsMessageHandler for AppInfoHandler {
    fn method_name(&self) -> &str {
        "appInfo"
    }

    fn handle(&self, _message: &JsMessage, _navigator: &Navigator, reply: Reply) {
        info!("jsbridge: appInfo");
        reply.send_json(&AppInfo {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            version: env!("CARGO_PKG_VERSION"),
        });
    }
}

pub struct NavigateHandler;

impl JsMessageHandler for NavigateHandler {
    fn method_name(&self) -> &str {
        "navigate"
    }

    fn handle(&self, message: &JsMessage, navigator: &Navigator, _reply: Reply) {
        let url = normalize_url(&message.param_str("url").unwrap_or_default());
        info!(url = %url, "jsbridge: navigate");
        navigator.load_url(url, Headers::new());
    }
}

pub struct SetCookieHandler {
    cookies: Arc<dyn CookieManager>,
    tasks: TaskTracker,
}

impl JsMessageHandler for SetCookieHandler {
    fn method_name(&self) -> &str {
        "setCookie"
    }

    fn handle(&self, message: &JsMessage, _navigator: &Navigator, reply: Reply) {
        let url = normalize_url(&message.param_str("url").unwrap_or_default());
        let name = message
            .param_str("name")
            .unwrap_or_else(|| "demo_cookie".to_string());
        let value = message
            .param_str("value")
            .unwrap_or_else(|| "from_js".to_string());

        let cookie = Cookie {
            domain: host_from_url(&url),
            path: Some("/".to_string()),
            is_session_only: true,
            is_secure: Some(url.starts_with("https://")),
            is_http_only: Some(false),
            same_site: Some(SameSite::Lax),
            ..Cookie::new(name.clone(), value)
        };

        let cookies = Arc::clone(&self.cookies);
        self.tasks.spawn(async move {
            match cookies.set_cookie(&url, cookie).await {
                Ok(()) => {
                    info!(url = %url, name = %name, "jsbridge: setCookie");
                    reply.send("ok");
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "jsbridge: setCookie failed");
                    reply.send(format!("error: {e}"));
                }
            }
        });
    }
}

pub struct GetCookiesHandler {
    cookies: Arc<dyn CookieManager>,
    tasks: TaskTracker,
}

impl JsMessageHandler for GetCookiesHandler {
    fn method_name(&self) -> &str {
        "getCookies"
    }

    fn handle(&self, message: &JsMessage, _navigator: &Navigator, reply: Reply) {
        let url = normalize_url(&message.param_str("url").unwrap_or_default());
        let cookies = Arc::clone(&self.cookies);
        self.tasks.spawn(async move {
            let found = cookies.get_cookies(&url).await.unwrap_or_else(|e| {
                warn!(url = %url, error = %e, "jsbridge: getCookies failed");
                Vec::new()
            });
            info!(url = %url, count = found.len(), "jsbridge: getCookies");
            let listed: Vec<String> = found.iter().map(ToString::to_string).collect();
            reply.send(format!("[{}]", listed.join(", ")));
        });
    }
}

pub struct CustomHandler;

impl JsMessageHandler for CustomHandler {
    fn method_name(&self) -> &str {
        "custom"
    }

    fn handle(&self, message: &JsMessage, _navigator: &Navigator, reply: Reply) {
        info!(params = %preview(&message.params, 160), "jsbridge: custom");
        reply.send(message.params.clone());
    }
}

pub struct GetConfigHandler {
    config_json: String,
}

impl JsMessageHandler for GetConfigHandler {
    fn method_name(&self) -> &str {
        "getConfig"
    }

    fn handle(&self, _message: &JsMessage, _navigator: &Navigator, reply: Reply) {
        info!("jsbridge: getConfig");
        reply.send(self.config_json.clone());
    }
}
