use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::message::JsMessage;
use crate::navigator::Navigator;

use super::handler::{JsMessageHandler, Reply};

/// Method name -> handler table. Registering a name twice replaces the
/// earlier handler.
#[derive(Default)]
pub struct Dispatcher {
    handlers: Mutex<HashMap<String, Arc<dyn JsMessageHandler>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn handlers(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn JsMessageHandler>>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, handler: Arc<dyn JsMessageHandler>) {
        let name = handler.method_name().to_string();
        if self.handlers().insert(name.clone(), handler).is_some() {
            debug!(method = %name, "handler replaced");
        } else {
            trace!(method = %name, "handler registered");
        }
    }

    pub fn unregister(&self, method_name: &str) -> bool {
        self.handlers().remove(method_name).is_some()
    }

    pub fn clear(&self) {
        self.handlers().clear();
    }

    pub fn contains(&self, method_name: &str) -> bool {
        self.handlers().contains_key(method_name)
    }

    pub fn len(&self) -> usize {
        self.handlers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers().is_empty()
    }

    /// Route `message` to its handler. Unknown methods are dropped.
    ///
    /// The table lock is released before the handler runs, so handlers may
    /// register or unregister other handlers.
    pub fn dispatch(&self, message: &JsMessage, navigator: &Navigator, reply: Reply) -> bool {
        let handler = self.handlers().get(&message.method_name).cloned();
        match handler {
            Some(handler) => {
                trace!(method = %message.method_name, callback_id = message.callback_id, "dispatching");
                handler.handle(message, navigator, reply);
                true
            }
            None => {
                debug!(method = %message.method_name, "no handler registered, message dropped");
                false
            }
        }
    }
}
