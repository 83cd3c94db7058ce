//! Host-facing navigation API.
//!
//! Every command becomes a [`NavigationEvent`] appended to one ordered
//! queue. Exactly one [`NavigationConsumer`] (the session bound to an
//! engine) drains it and executes each event against the engine binding.
//! Emitting never blocks and is safe from any thread, including from inside
//! a message handler or a request interceptor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::{debug, trace};
use webbridge_common::BridgeError;

use crate::content::{FileSource, HtmlData};
use crate::request::{Headers, InterceptResult, RequestInterceptor, WebRequest};

mod event;
mod executor;
mod queue;

pub use event::{NavigationEvent, ScriptCallback};
pub use executor::{decide_load, execute_event};
pub use queue::NavigationConsumer;

use queue::QueueState;

pub(crate) struct Inner {
    queue: Mutex<QueueState>,
    wakeup: Notify,
    interceptor: Mutex<Option<Arc<dyn RequestInterceptor>>>,
    can_go_back: AtomicBool,
    can_go_forward: AtomicBool,
    /// One-shot: the next engine-initiated navigation was already decided.
    skip_next_interception: AtomicBool,
}

impl Inner {
    fn queue(&self) -> MutexGuard<'_, QueueState> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable handle for issuing navigation commands.
#[derive(Clone)]
pub struct Navigator {
    inner: Arc<Inner>,
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(QueueState::default()),
                wakeup: Notify::new(),
                interceptor: Mutex::new(None),
                can_go_back: AtomicBool::new(false),
                can_go_forward: AtomicBool::new(false),
                skip_next_interception: AtomicBool::new(false),
            }),
        }
    }

    /// Create a navigator whose loads pass through `interceptor`.
    pub fn with_interceptor(interceptor: impl RequestInterceptor + 'static) -> Self {
        let navigator = Self::new();
        navigator.set_request_interceptor(Some(Arc::new(interceptor)));
        navigator
    }

    pub fn set_request_interceptor(&self, interceptor: Option<Arc<dyn RequestInterceptor>>) {
        *self
            .inner
            .interceptor
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = interceptor;
    }

    pub fn request_interceptor(&self) -> Option<Arc<dyn RequestInterceptor>> {
        self.inner
            .interceptor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Append an event. Never blocks.
    pub fn emit(&self, event: NavigationEvent) {
        trace!(event = event.kind(), "navigation event emitted");
        self.inner.queue().push(event);
        self.inner.wakeup.notify_one();
    }

    pub fn load_url(&self, url: impl Into<String>, headers: Headers) {
        self.emit(NavigationEvent::LoadUrl {
            url: url.into(),
            headers,
            decided: false,
        });
    }

    pub fn load_html(&self, data: HtmlData) {
        self.emit(NavigationEvent::LoadHtml(data));
    }

    pub fn load_html_file(&self, path: impl Into<String>, source: FileSource) {
        self.emit(NavigationEvent::LoadHtmlFile {
            path: path.into(),
            source,
        });
    }

    pub fn evaluate_javascript(&self, script: impl Into<String>, callback: Option<ScriptCallback>) {
        self.emit(NavigationEvent::EvaluateScript {
            script: script.into(),
            callback,
        });
    }

    pub fn navigate_back(&self) {
        self.emit(NavigationEvent::Back);
    }

    pub fn navigate_forward(&self) {
        self.emit(NavigationEvent::Forward);
    }

    pub fn reload(&self) {
        self.emit(NavigationEvent::Reload);
    }

    pub fn stop_loading(&self) {
        self.emit(NavigationEvent::StopLoading);
    }

    pub fn can_go_back(&self) -> bool {
        self.inner.can_go_back.load(Ordering::Acquire)
    }

    pub fn can_go_forward(&self) -> bool {
        self.inner.can_go_forward.load(Ordering::Acquire)
    }

    pub(crate) fn set_navigability(&self, can_go_back: bool, can_go_forward: bool) {
        self.inner.can_go_back.store(can_go_back, Ordering::Release);
        self.inner
            .can_go_forward
            .store(can_go_forward, Ordering::Release);
    }

    /// Claim the consumer end of the queue.
    ///
    /// Fails with [`BridgeError::ConsumerAttached`] while another consumer
    /// is alive.
    pub fn attach_consumer(&self) -> Result<NavigationConsumer, BridgeError> {
        let mut queue = self.inner.queue();
        if queue.consumer_attached {
            return Err(BridgeError::ConsumerAttached);
        }
        queue.consumer_attached = true;
        debug!(pending = queue.events.len(), "navigation consumer attached");
        Ok(NavigationConsumer {
            inner: Arc::clone(&self.inner),
        })
    }

    pub fn has_consumer(&self) -> bool {
        self.inner.queue().consumer_attached
    }

    /// Decide a navigation the engine started on its own (link click,
    /// redirect, script-driven location change). Returns whether the engine
    /// should proceed.
    ///
    /// Engines cannot substitute a request in place, so a rewrite stops the
    /// current load and re-issues the replacement as an already-decided
    /// `LoadUrl`. The engine then reports that load here too; the one-shot
    /// skip flag lets it through without a second interception.
    pub fn intercept_engine_navigation(&self, request: WebRequest) -> bool {
        if self
            .inner
            .skip_next_interception
            .swap(false, Ordering::AcqRel)
        {
            trace!(url = %request.url, "navigation already decided");
            return true;
        }

        let Some(interceptor) = self.request_interceptor() else {
            return true;
        };

        let mut candidate = request.clone();
        let replacement = match interceptor.on_intercept_url_request(&mut candidate, self) {
            InterceptResult::Allow if candidate == request => return true,
            InterceptResult::Allow => candidate,
            InterceptResult::Reject => {
                debug!(url = %request.url, "engine navigation rejected");
                return false;
            }
            InterceptResult::Modify(replacement) => replacement,
        };

        debug!(from = %request.url, to = %replacement.url, "engine navigation rewritten");
        self.stop_loading();
        self.emit(NavigationEvent::LoadUrl {
            url: replacement.url,
            headers: replacement.headers,
            decided: true,
        });
        false
    }

    /// Let the next engine-reported navigation through without interception.
    pub(crate) fn mark_decided(&self) {
        self.inner
            .skip_next_interception
            .store(true, Ordering::Release);
    }

    pub(crate) fn clear_decided(&self) {
        self.inner
            .skip_next_interception
            .store(false, Ordering::Release);
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("can_go_back", &self.can_go_back())
            .field("can_go_forward", &self.can_go_forward())
            .field("has_consumer", &self.has_consumer())
            .finish()
    }
}
