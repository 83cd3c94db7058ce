use std::sync::{Arc, Weak};

use serde::Serialize;
use tracing::debug;

use crate::message::{encode_data, reply_script, JsMessage};
use crate::navigator::{NavigationEvent, Navigator};

/// Host-side implementation of one page-callable method.
///
/// `handle` may answer right away or move `reply` into a task and answer
/// later. Not answering at all is allowed too; the page callback then
/// simply never fires.
pub trait JsMessageHandler: Send + Sync {
    fn method_name(&self) -> &str;

    fn can_handle(&self, method_name: &str) -> bool {
        self.method_name() == method_name
    }

    fn handle(&self, message: &JsMessage, navigator: &Navigator, reply: Reply);
}

/// Continuation that answers one page call.
///
/// Sending queues the reply script on the navigator, so it is executed by
/// the session that owns the engine, whichever thread `send` runs on.
/// Once that engine binding is gone, sending is a silent no-op, and a reply
/// already queued is skipped rather than run against a later engine.
pub struct Reply {
    callback_id: i32,
    bridge_name: Arc<str>,
    navigator: Navigator,
    binding: Weak<()>,
}

impl Reply {
    pub(crate) fn new(
        callback_id: i32,
        bridge_name: Arc<str>,
        navigator: Navigator,
        binding: Weak<()>,
    ) -> Self {
        Self {
            callback_id,
            bridge_name,
            navigator,
            binding,
        }
    }

    pub fn callback_id(&self) -> i32 {
        self.callback_id
    }

    /// Whether the page is waiting on this reply.
    pub fn expects_reply(&self) -> bool {
        self.callback_id >= 0
    }

    /// Deliver `data` (JSON text) to the page callback. Returns whether a
    /// reply script was queued.
    pub fn send(self, data: impl Into<String>) -> bool {
        let data = data.into();
        let Some(script) = reply_script(&self.bridge_name, self.callback_id, &data) else {
            return false;
        };
        if self.binding.upgrade().is_none() {
            debug!(
                callback_id = self.callback_id,
                "reply dropped: engine binding is gone"
            );
            return false;
        }
        debug!(callback_id = self.callback_id, bytes = data.len(), "reply queued");
        self.navigator.emit(NavigationEvent::Reply {
            script,
            binding: self.binding,
        });
        true
    }

    /// Serialize `value` and deliver it.
    pub fn send_json<T: Serialize>(self, value: &T) -> bool {
        self.send(encode_data(value))
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reply")
            .field("callback_id", &self.callback_id)
            .field("bridge_name", &self.bridge_name)
            .field("live", &(self.binding.strong_count() > 0))
            .finish()
    }
}

/// A handler backed by a closure.
pub struct FnHandler<F> {
    method_name: String,
    f: F,
}

/// Wrap a closure as a [`JsMessageHandler`] for `method_name`.
pub fn handler_fn<F>(method_name: impl Into<String>, f: F) -> FnHandler<F>
where
    F: Fn(&JsMessage, &Navigator, Reply) + Send + Sync,
{
    FnHandler {
        method_name: method_name.into(),
        f,
    }
}

impl<F> JsMessageHandler for FnHandler<F>
where
    F: Fn(&JsMessage, &Navigator, Reply) + Send + Sync,
{
    fn method_name(&self) -> &str {
        &self.method_name
    }

    fn handle(&self, message: &JsMessage, navigator: &Navigator, reply: Reply) {
        (self.f)(message, navigator, reply)
    }
}
