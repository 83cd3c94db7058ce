//! In-page bridge runtime injected after every completed navigation.
//!
//! The bootstrap defines `window.<name>` with:
//! - `callNative(methodName, params, callback)`: packages a message,
//!   allocates an increasing callback id when a callback is given and posts
//!   the JSON text through `postMessage`.
//! - `onCallback(id, data)`: invokes and deletes the stored callback, so
//!   each id fires at most once.
//! - `postMessage`: a no-op placeholder replaced by the transport hook.
//!
//! Both scripts test for existence in the page, so re-injecting into a page
//! that already has the object changes nothing there.

use serde::{Deserialize, Serialize};

/// Native channel a page uses to reach the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name")]
pub enum MessageTransport {
    /// `window.ipc.postMessage(text)`, provided by wry.
    Ipc,
    /// An object injected by the engine exposing `call(text)`.
    JavascriptInterface(String),
    /// `window.webkit.messageHandlers.<name>.postMessage(text)`.
    WebKitHandler(String),
}

/// Script that creates the bridge object unless the page already has it.
pub fn bootstrap_script(bridge_name: &str) -> String {
    let n = bridge_name;
    format!(
        r#"(function() {{
    if (typeof window.{n} !== 'undefined') {{
        return;
    }}
    window.{n} = {{
        callbacks: {{}},
        callbackId: 0,
        callNative: function (methodName, params, callback) {{
            var message = {{
                methodName: methodName,
                params: params,
                callbackId: callback ? window.{n}.callbackId++ : -1
            }};
            if (callback) {{
                window.{n}.callbacks[message.callbackId] = callback;
            }}
            window.{n}.postMessage(JSON.stringify(message));
        }},
        onCallback: function (callbackId, data) {{
            var callback = window.{n}.callbacks[callbackId];
            if (callback) {{
                delete window.{n}.callbacks[callbackId];
                callback(data);
            }}
        }},
        postMessage: function (_) {{ /* replaced by the transport hook */ }}
    }};
}})();"#
    )
}

/// Script that points `window.<name>.postMessage` at the native channel.
///
/// Inert when either the bridge object or the channel is missing.
pub fn transport_hook_script(bridge_name: &str, transport: &MessageTransport) -> String {
    let n = bridge_name;
    let (guard, call) = match transport {
        MessageTransport::Ipc => (
            "window.ipc && window.ipc.postMessage".to_string(),
            "window.ipc.postMessage(message);".to_string(),
        ),
        MessageTransport::JavascriptInterface(obj) => (
            format!("window.{obj} && window.{obj}.call"),
            format!("window.{obj}.call(message);"),
        ),
        MessageTransport::WebKitHandler(handler) => (
            format!(
                "window.webkit && window.webkit.messageHandlers && window.webkit.messageHandlers.{handler}"
            ),
            format!("window.webkit.messageHandlers.{handler}.postMessage(message);"),
        ),
    };
    format!(
        r#"if (window.{n} && {guard}) {{
    window.{n}.postMessage = function (message) {{
        {call}
    }};
}}"#
    )
}

/// Bootstrap followed by the transport hook, as one evaluation.
pub fn injection_script(bridge_name: &str, transport: &MessageTransport) -> String {
    format!(
        "{}\n{}",
        bootstrap_script(bridge_name),
        transport_hook_script(bridge_name, transport)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_is_existence_guarded() {
        let js = bootstrap_script("kmpJsBridge");
        assert!(js.contains("if (typeof window.kmpJsBridge !== 'undefined')"));
        assert!(js.contains("window.kmpJsBridge = {"));
    }

    #[test]
    fn bootstrap_defines_call_out_and_reply_dispatch() {
        let js = bootstrap_script("b");
        assert!(js.contains("callNative: function (methodName, params, callback)"));
        assert!(js.contains("callbackId: callback ? window.b.callbackId++ : -1"));
        assert!(js.contains("onCallback: function (callbackId, data)"));
        assert!(js.contains("delete window.b.callbacks[callbackId]"));
        assert!(js.contains("window.b.postMessage(JSON.stringify(message))"));
    }

    #[test]
    fn bootstrap_uses_configured_name_everywhere() {
        let js = bootstrap_script("hostBridge");
        assert!(!js.contains("kmpJsBridge"));
        assert!(js.matches("window.hostBridge").count() >= 6);
    }

    #[test]
    fn ipc_hook_targets_wry_channel() {
        let js = transport_hook_script("kmpJsBridge", &MessageTransport::Ipc);
        assert!(js.contains("if (window.kmpJsBridge && window.ipc && window.ipc.postMessage)"));
        assert!(js.contains("window.ipc.postMessage(message);"));
    }

    #[test]
    fn javascript_interface_hook() {
        let js = transport_hook_script(
            "kmpJsBridge",
            &MessageTransport::JavascriptInterface("androidJsBridge".into()),
        );
        assert!(js.contains("window.androidJsBridge && window.androidJsBridge.call"));
        assert!(js.contains("window.androidJsBridge.call(message);"));
    }

    #[test]
    fn webkit_hook() {
        let js = transport_hook_script(
            "kmpJsBridge",
            &MessageTransport::WebKitHandler("jsBridge".into()),
        );
        assert!(js.contains("window.webkit.messageHandlers.jsBridge.postMessage(message);"));
    }

    #[test]
    fn injection_runs_bootstrap_before_hook() {
        let js = injection_script("b", &MessageTransport::Ipc);
        let boot = js.find("window.b = {").unwrap();
        let hook = js.find("window.b.postMessage = function").unwrap();
        assert!(boot < hook);
    }
}
