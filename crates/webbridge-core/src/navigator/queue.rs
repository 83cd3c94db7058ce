//! Single-consumer FIFO behind the navigator.
//!
//! While no consumer is attached the queue holds at most one event, the
//! latest. A consumer attaching late therefore sees only the most recent
//! command, never a stale history of them. Replies belong to the engine
//! that was attached when they were produced and are never held over.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use super::event::NavigationEvent;
use super::Inner;

#[derive(Default)]
pub(crate) struct QueueState {
    pub(crate) events: VecDeque<NavigationEvent>,
    pub(crate) consumer_attached: bool,
}

impl QueueState {
    pub(crate) fn push(&mut self, event: NavigationEvent) {
        if !self.consumer_attached {
            if event.is_reply() {
                debug!("reply dropped: no engine attached");
                return;
            }
            self.events.clear();
        }
        self.events.push_back(event);
    }

    fn keep_latest(&mut self) {
        self.events.retain(|event| !event.is_reply());
        while self.events.len() > 1 {
            self.events.pop_front();
        }
    }
}

/// Exclusive receiving end of a navigator's event stream.
///
/// At most one exists per navigator. Dropping it detaches: anything still
/// pending collapses to the latest event, which a later consumer replays.
pub struct NavigationConsumer {
    pub(super) inner: Arc<Inner>,
}

impl NavigationConsumer {
    /// Take the next event without waiting.
    pub fn try_next(&self) -> Option<NavigationEvent> {
        self.inner.queue().events.pop_front()
    }

    /// Wait for the next event.
    ///
    /// Cancel-safe: an event is only removed from the queue when this
    /// future completes.
    pub async fn next(&self) -> NavigationEvent {
        loop {
            let notified = self.inner.wakeup.notified();
            if let Some(event) = self.try_next() {
                return event;
            }
            notified.await;
        }
    }

    /// Take everything currently queued, in order.
    pub fn drain(&self) -> Vec<NavigationEvent> {
        self.inner.queue().events.drain(..).collect()
    }

    /// Number of events waiting.
    pub fn pending(&self) -> usize {
        self.inner.queue().events.len()
    }
}

impl Drop for NavigationConsumer {
    fn drop(&mut self) {
        let mut queue = self.inner.queue();
        queue.consumer_attached = false;
        queue.keep_latest();
        debug!(pending = queue.events.len(), "navigation consumer detached");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Weak};

    use super::*;
    use crate::request::Headers;

    fn load(url: &str) -> NavigationEvent {
        NavigationEvent::LoadUrl {
            url: url.into(),
            headers: Headers::new(),
            decided: false,
        }
    }

    fn reply(binding: &Arc<()>) -> NavigationEvent {
        NavigationEvent::Reply {
            script: "window.b.onCallback(1, \"x\");".into(),
            binding: Arc::downgrade(binding),
        }
    }

    #[test]
    fn replies_are_not_queued_without_consumer() {
        let mut queue = QueueState::default();
        queue.push(load("https://a.test"));
        queue.push(NavigationEvent::Reply {
            script: String::new(),
            binding: Weak::new(),
        });
        assert_eq!(queue.events.len(), 1);
        assert_eq!(queue.events[0].kind(), "load_url");
    }

    #[test]
    fn detaching_drops_replies_before_keeping_latest() {
        let binding = Arc::new(());
        let mut queue = QueueState {
            consumer_attached: true,
            ..QueueState::default()
        };
        queue.push(load("https://a.test"));
        queue.push(NavigationEvent::Reload);
        queue.push(reply(&binding));
        queue.consumer_attached = false;
        queue.keep_latest();
        assert_eq!(queue.events.len(), 1);
        assert_eq!(queue.events[0].kind(), "reload");
    }

    #[test]
    fn only_replies_pending_leaves_nothing() {
        let binding = Arc::new(());
        let mut queue = QueueState {
            consumer_attached: true,
            ..QueueState::default()
        };
        queue.push(reply(&binding));
        queue.keep_latest();
        assert!(queue.events.is_empty());
    }
}
