//! JS bridge: handler registry, dispatch and replies for one view.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::debug;
use webbridge_config::BridgeSection;

use crate::message::{parse_js_message, JsMessage};
use crate::navigator::Navigator;

mod dispatcher;
mod handler;

pub use dispatcher::Dispatcher;
pub use handler::{handler_fn, FnHandler, JsMessageHandler, Reply};

/// Host side of the in-page `window.<name>` object.
///
/// Owns the handler table and knows whether an engine binding is currently
/// attached. Replies created while bound hold a weak reference to that
/// binding and turn into no-ops once it goes away.
pub struct JsBridge {
    name: Arc<str>,
    navigator: Navigator,
    dispatcher: Dispatcher,
    binding: Mutex<Option<Arc<()>>>,
}

impl JsBridge {
    pub fn new(name: impl Into<String>, navigator: Navigator) -> Self {
        Self {
            name: Arc::from(name.into()),
            navigator,
            dispatcher: Dispatcher::new(),
            binding: Mutex::new(None),
        }
    }

    pub fn from_config(section: &BridgeSection, navigator: Navigator) -> Self {
        Self::new(section.name.clone(), navigator)
    }

    /// Name of the page object, e.g. `kmpJsBridge`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn register(&self, handler: impl JsMessageHandler + 'static) {
        self.dispatcher.register(Arc::new(handler));
    }

    pub fn register_shared(&self, handler: Arc<dyn JsMessageHandler>) {
        self.dispatcher.register(handler);
    }

    /// Remove whatever is registered under `handler`'s method name.
    pub fn unregister(&self, handler: &dyn JsMessageHandler) -> bool {
        self.dispatcher.unregister(handler.method_name())
    }

    pub fn unregister_method(&self, method_name: &str) -> bool {
        self.dispatcher.unregister(method_name)
    }

    pub fn clear(&self) {
        self.dispatcher.clear();
    }

    pub fn has_handler(&self, method_name: &str) -> bool {
        self.dispatcher.contains(method_name)
    }

    pub fn handler_count(&self) -> usize {
        self.dispatcher.len()
    }

    /// Route a parsed message. Every call dispatches again; there is no
    /// de-duplication of repeated messages.
    pub fn dispatch(&self, message: &JsMessage) -> bool {
        let reply = self.reply_for(message.callback_id);
        self.dispatcher.dispatch(message, &self.navigator, reply)
    }

    /// Parse raw page text and dispatch it. Malformed text is logged and
    /// dropped.
    pub fn handle_raw(&self, raw: &str) -> bool {
        match parse_js_message(raw) {
            Some(message) => self.dispatch(&message),
            None => false,
        }
    }

    /// A reply continuation for `callback_id`, tied to the current binding.
    pub fn reply_for(&self, callback_id: i32) -> Reply {
        let binding = self
            .binding()
            .as_ref()
            .map(Arc::downgrade)
            .unwrap_or_else(Weak::new);
        Reply::new(
            callback_id,
            Arc::clone(&self.name),
            self.navigator.clone(),
            binding,
        )
    }

    pub fn is_bound(&self) -> bool {
        self.binding().is_some()
    }

    pub(crate) fn bind_engine(&self) {
        *self.binding() = Some(Arc::new(()));
        debug!(bridge = %self.name, "bridge bound to engine");
    }

    pub(crate) fn unbind_engine(&self) {
        if self.binding().take().is_some() {
            debug!(bridge = %self.name, "bridge unbound from engine");
        }
    }

    fn binding(&self) -> MutexGuard<'_, Option<Arc<()>>> {
        self.binding.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for JsBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsBridge")
            .field("name", &self.name)
            .field("handlers", &self.handler_count())
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::{NavigationConsumer, NavigationEvent};
    use crate::request::Headers;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bound_bridge() -> (JsBridge, NavigationConsumer) {
        let nav = Navigator::new();
        let consumer = nav.attach_consumer().unwrap();
        let bridge = JsBridge::new("kmpJsBridge", nav);
        bridge.bind_engine();
        (bridge, consumer)
    }

    fn scripts(consumer: &NavigationConsumer) -> Vec<String> {
        consumer
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                NavigationEvent::Reply { script, .. } => Some(script),
                _ => None,
            })
            .collect()
    }

    fn echo() -> impl JsMessageHandler {
        handler_fn("echo", |msg: &JsMessage, _: &Navigator, reply: Reply| {
            let text = msg.param_str("text").unwrap_or_default();
            reply.send_json(&text);
        })
    }

    #[test]
    fn echo_reply_is_double_encoded() {
        let (bridge, consumer) = bound_bridge();
        bridge.register(echo());
        assert!(bridge.handle_raw(
            r#"{"callbackId":3,"methodName":"echo","params":"{\"text\":\"hi\"}"}"#
        ));
        assert_eq!(
            scripts(&consumer),
            vec![r#"window.kmpJsBridge.onCallback(3, "\"hi\"");"#.to_string()]
        );
    }

    #[test]
    fn fire_and_forget_never_injects() {
        let (bridge, consumer) = bound_bridge();
        bridge.register(echo());
        assert!(bridge.dispatch(&JsMessage::new(-1, "echo", r#"{"text":"x"}"#)));
        assert!(scripts(&consumer).is_empty());
    }

    #[test]
    fn unknown_method_is_dropped() {
        let (bridge, consumer) = bound_bridge();
        assert!(!bridge.dispatch(&JsMessage::new(1, "nope", "")));
        assert!(scripts(&consumer).is_empty());
    }

    #[test]
    fn malformed_text_is_dropped() {
        let (bridge, _consumer) = bound_bridge();
        bridge.register(echo());
        assert!(!bridge.handle_raw("{oops"));
        assert!(!bridge.handle_raw(r#"{"callbackId":1}"#));
    }

    #[test]
    fn last_registration_wins() {
        let (bridge, _consumer) = bound_bridge();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&first);
        bridge.register(handler_fn("m", move |_: &JsMessage, _: &Navigator, _: Reply| {
            f.fetch_add(1, Ordering::SeqCst);
        }));
        let s = Arc::clone(&second);
        bridge.register(handler_fn("m", move |_: &JsMessage, _: &Navigator, _: Reply| {
            s.fetch_add(1, Ordering::SeqCst);
        }));
        bridge.dispatch(&JsMessage::new(-1, "m", ""));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(bridge.handler_count(), 1);
    }

    #[test]
    fn dispatching_twice_invokes_twice() {
        let (bridge, _consumer) = bound_bridge();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        bridge.register(handler_fn("m", move |_: &JsMessage, _: &Navigator, _: Reply| {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        let msg = JsMessage::new(1, "m", "");
        bridge.dispatch(&msg);
        bridge.dispatch(&msg);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unregister_and_clear() {
        let (bridge, _consumer) = bound_bridge();
        let handler = echo();
        bridge.register(echo());
        bridge.register(handler_fn("other", |_: &JsMessage, _: &Navigator, _: Reply| {}));
        assert!(bridge.unregister(&handler));
        assert!(!bridge.has_handler("echo"));
        assert!(bridge.has_handler("other"));
        bridge.clear();
        assert_eq!(bridge.handler_count(), 0);
    }

    #[test]
    fn handlers_can_navigate() {
        let (bridge, consumer) = bound_bridge();
        bridge.register(handler_fn("navigate", |msg: &JsMessage, nav: &Navigator, _: Reply| {
            if let Some(url) = msg.param_str("url") {
                nav.load_url(url, Headers::new());
            }
        }));
        bridge.dispatch(&JsMessage::new(-1, "navigate", r#"{"url":"https://b.test"}"#));
        let events = consumer.drain();
        assert!(matches!(
            &events[..],
            [NavigationEvent::LoadUrl { url, .. }] if url == "https://b.test"
        ));
    }

    #[test]
    fn reply_after_unbind_is_noop() {
        let (bridge, consumer) = bound_bridge();
        let reply = bridge.reply_for(5);
        bridge.unbind_engine();
        assert!(!reply.send("\"late\""));
        assert!(scripts(&consumer).is_empty());
    }

    #[test]
    fn reply_before_bind_is_noop() {
        let nav = Navigator::new();
        let consumer = nav.attach_consumer().unwrap();
        let bridge = JsBridge::new("b", nav);
        assert!(!bridge.reply_for(1).send("1"));
        assert_eq!(consumer.pending(), 0);
    }

    #[test]
    fn deferred_reply_from_another_thread() {
        let (bridge, consumer) = bound_bridge();
        bridge.register(handler_fn("later", |_: &JsMessage, _: &Navigator, reply: Reply| {
            std::thread::spawn(move || {
                reply.send("42");
            });
        }));
        bridge.dispatch(&JsMessage::new(9, "later", ""));
        for _ in 0..200 {
            if consumer.pending() > 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(
            scripts(&consumer),
            vec![r#"window.kmpJsBridge.onCallback(9, "42");"#.to_string()]
        );
    }

    #[test]
    fn handler_may_register_during_dispatch() {
        let nav = Navigator::new();
        let bridge = Arc::new(JsBridge::new("b", nav));
        let weak = Arc::downgrade(&bridge);
        bridge.register(handler_fn("install", move |_: &JsMessage, _: &Navigator, _: Reply| {
            if let Some(bridge) = weak.upgrade() {
                bridge.register(handler_fn("extra", |_: &JsMessage, _: &Navigator, _: Reply| {}));
            }
        }));
        bridge.dispatch(&JsMessage::new(-1, "install", ""));
        assert!(bridge.has_handler("extra"));
    }
}
