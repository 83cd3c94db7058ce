//! One embedded view: navigator, bridge, state mirror and engine binding.
//!
//! The session is the single owner context the rest of the crate hands work
//! back to. Everything that touches the engine or the snapshot happens in
//! [`WebSession::pump`], [`WebSession::poll_once`] or [`WebSession::run`]:
//!
//! - engine signals are applied to the [`StateMirror`]; every completed
//!   load re-injects the bridge bootstrap
//! - raw page messages are parsed and dispatched to the [`JsBridge`]
//! - queued navigation events (including replies) are executed against the
//!   binding, in order
//!
//! Hosts with their own event loop (a windowing toolkit, say) call `pump`
//! from it; async hosts can `run` the session until cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use webbridge_common::{BridgeError, SessionId};
use webbridge_config::{BridgeConfig, PollingConfig};

use crate::bootstrap::injection_script;
use crate::bridge::JsBridge;
use crate::content::WebContent;
use crate::engine::{EngineBinding, EngineSample};
use crate::events::EngineSignal;
use crate::navigator::{execute_event, NavigationConsumer, NavigationEvent, Navigator};
use crate::state::{EngineStateSnapshot, PollTracker, StateMirror};

/// Upper bound on rounds in [`WebSession::pump_until_idle`]. Work that keeps
/// generating more work (a page posting on every load) must not spin
/// forever.
const MAX_PUMP_ROUNDS: usize = 64;

struct Attached {
    binding: Box<dyn EngineBinding>,
    consumer: NavigationConsumer,
}

pub struct WebSession {
    id: SessionId,
    navigator: Navigator,
    bridge: Option<Arc<JsBridge>>,
    mirror: StateMirror,
    poll: PollTracker,
    polling: PollingConfig,
    content: WebContent,
    attached: Option<Attached>,
    cancel: CancellationToken,
}

impl WebSession {
    pub fn new(navigator: Navigator, content: WebContent) -> Self {
        let polling = PollingConfig::default();
        Self {
            id: SessionId::new(),
            mirror: StateMirror::new(navigator.clone()),
            poll: PollTracker::new(&polling),
            polling,
            navigator,
            bridge: None,
            content,
            attached: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Build a session with a bridge named and polled as configured.
    ///
    /// With [`WebContent::NavigatorOnly`], `engine.initial_url` (when set)
    /// becomes the initial content.
    pub fn from_config(config: &BridgeConfig, navigator: Navigator, content: WebContent) -> Self {
        let content = match (content, &config.engine.initial_url) {
            (WebContent::NavigatorOnly, Some(url)) => WebContent::NavigatorOnly.with_url(url),
            (content, _) => content,
        };
        let bridge = Arc::new(JsBridge::from_config(&config.bridge, navigator.clone()));
        Self::new(navigator, content)
            .with_bridge(bridge)
            .with_polling(config.polling.clone())
    }

    pub fn with_bridge(mut self, bridge: Arc<JsBridge>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.poll = PollTracker::new(&polling);
        self.polling = polling;
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn bridge(&self) -> Option<&Arc<JsBridge>> {
        self.bridge.as_ref()
    }

    pub fn snapshot(&self) -> &EngineStateSnapshot {
        self.mirror.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineStateSnapshot> {
        self.mirror.subscribe()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Bind an engine: claim the navigation queue, load the initial content
    /// and inject the bridge bootstrap.
    pub fn attach(&mut self, binding: Box<dyn EngineBinding>) -> Result<(), BridgeError> {
        if self.attached.is_some() {
            return Err(BridgeError::ConsumerAttached);
        }
        let consumer = self.navigator.attach_consumer()?;
        if let Some(bridge) = &self.bridge {
            bridge.bind_engine();
        }
        self.cancel = CancellationToken::new();

        if let Some(event) = initial_event(&self.content) {
            execute_event(&self.navigator, binding.as_ref(), event);
        }
        self.attached = Some(Attached { binding, consumer });
        self.ensure_bootstrap()?;
        self.sync_navigability();

        info!(session = %self.id, "engine attached");
        Ok(())
    }

    /// Tear down the engine binding and hand it back.
    ///
    /// Cancels `run`, clears the handler registry and turns outstanding
    /// replies into no-ops. Undelivered navigation events collapse to the
    /// latest one, which the next attached engine replays.
    pub fn detach(&mut self) -> Option<Box<dyn EngineBinding>> {
        let attached = self.attached.take()?;
        self.cancel.cancel();
        if let Some(bridge) = &self.bridge {
            bridge.unbind_engine();
            bridge.clear();
        }
        drop(attached.consumer);
        info!(session = %self.id, "engine detached");
        Some(attached.binding)
    }

    /// Evaluate the bridge bootstrap and transport hook in the page.
    ///
    /// Safe to repeat: the scripts check for the page object themselves.
    pub fn ensure_bootstrap(&self) -> Result<(), BridgeError> {
        let (Some(bridge), Some(attached)) = (&self.bridge, &self.attached) else {
            return Ok(());
        };
        let script = injection_script(bridge.name(), &attached.binding.message_transport());
        attached.binding.evaluate_script(&script, None)?;
        debug!(session = %self.id, bridge = %bridge.name(), "bootstrap injected");
        Ok(())
    }

    /// Apply one engine signal; a completed load triggers re-injection.
    pub fn on_signal(&mut self, signal: EngineSignal) {
        // A started load means any pending skip-once decision has been used
        // or will never be asked for.
        if matches!(signal, EngineSignal::PageStarted { .. }) {
            self.navigator.clear_decided();
        }
        if self.mirror.apply(signal) {
            if let Err(e) = self.ensure_bootstrap() {
                warn!(session = %self.id, error = %e, "bootstrap injection failed");
            }
        }
    }

    /// Parse and dispatch one raw page message.
    pub fn on_ipc_message(&self, raw: &str) -> bool {
        match &self.bridge {
            Some(bridge) => bridge.handle_raw(raw),
            None => {
                debug!(session = %self.id, "page message ignored: no bridge");
                false
            }
        }
    }

    /// One round of work: engine signals, page messages, then queued
    /// navigation events. Returns how many items were processed.
    pub fn pump(&mut self) -> Result<usize, BridgeError> {
        let Some(attached) = self.attached.as_mut() else {
            return Err(BridgeError::Detached);
        };
        let signals = attached.binding.take_signals();
        let messages = attached.binding.drain_ipc_messages();
        let mut processed = signals.len() + messages.len();

        if !signals.is_empty() {
            for signal in signals {
                self.on_signal(signal);
            }
            self.sync_navigability();
        }

        for raw in &messages {
            self.on_ipc_message(raw);
        }

        if let Some(attached) = &self.attached {
            let events = attached.consumer.drain();
            processed += events.len();
            for event in events {
                execute_event(&self.navigator, attached.binding.as_ref(), event);
            }
        }
        Ok(processed)
    }

    /// Pump until a round finds nothing to do.
    pub fn pump_until_idle(&mut self) -> Result<usize, BridgeError> {
        let mut total = 0;
        for _ in 0..MAX_PUMP_ROUNDS {
            let processed = self.pump()?;
            if processed == 0 {
                return Ok(total);
            }
            total += processed;
        }
        debug!(session = %self.id, rounds = MAX_PUMP_ROUNDS, "pump still busy, yielding");
        Ok(total)
    }

    /// Sample a poll engine once and mirror the result. Returns how long to
    /// wait before the next sample.
    pub fn poll_once(&mut self) -> Duration {
        let Some(attached) = &self.attached else {
            return self.polling.not_ready_retry();
        };
        let Some(sample) = attached.binding.sample() else {
            return self.polling.interval();
        };

        let retry = matches!(sample, EngineSample::NotReady);
        for signal in self.poll.signals_for(&sample, self.mirror.snapshot()) {
            self.on_signal(signal);
        }
        if retry {
            self.polling.not_ready_retry()
        } else {
            self.polling.interval()
        }
    }

    /// Drive the session until cancelled or detached.
    ///
    /// Navigation events are executed as they arrive; page messages, pushed
    /// signals and poll samples are picked up on each tick.
    pub async fn run(&mut self) -> Result<(), BridgeError> {
        if self.attached.is_none() {
            return Err(BridgeError::Detached);
        }
        let cancel = self.cancel.clone();
        let mut delay = Duration::ZERO;
        debug!(session = %self.id, "session loop started");

        loop {
            let Some(attached) = &self.attached else {
                break;
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = attached.consumer.next() => {
                    self.execute(event);
                    self.pump()?;
                }
                _ = tokio::time::sleep(delay) => {
                    delay = self.poll_once();
                    self.pump()?;
                }
            }
        }

        debug!(session = %self.id, "session loop stopped");
        Ok(())
    }

    fn execute(&self, event: NavigationEvent) {
        if let Some(attached) = &self.attached {
            execute_event(&self.navigator, attached.binding.as_ref(), event);
        }
    }

    fn sync_navigability(&mut self) {
        let Some(attached) = &self.attached else {
            return;
        };
        let signal = EngineSignal::NavigabilityChanged {
            can_go_back: attached.binding.can_go_back(),
            can_go_forward: attached.binding.can_go_forward(),
        };
        self.mirror.apply(signal);
    }
}

impl Drop for WebSession {
    fn drop(&mut self) {
        self.detach();
    }
}

fn initial_event(content: &WebContent) -> Option<NavigationEvent> {
    match content {
        WebContent::Url { url, headers } => Some(NavigationEvent::LoadUrl {
            url: url.clone(),
            headers: headers.clone(),
            decided: false,
        }),
        WebContent::Data(data) => Some(NavigationEvent::LoadHtml(data.clone())),
        WebContent::File { path, source } => Some(NavigationEvent::LoadHtmlFile {
            path: path.clone(),
            source: *source,
        }),
        WebContent::NavigatorOnly => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{handler_fn, Reply};
    use crate::message::JsMessage;
    use crate::request::Headers;
    use crate::scripted::{EngineCall, ScriptedEngine};
    use crate::state::LoadingState;

    fn session(content: WebContent) -> WebSession {
        let nav = Navigator::new();
        let bridge = Arc::new(JsBridge::new("kmpJsBridge", nav.clone()));
        WebSession::new(nav, content).with_bridge(bridge)
    }

    #[test]
    fn attach_loads_content_then_bootstraps() {
        let mut s = session(WebContent::url("https://a.test"));
        let engine = ScriptedEngine::push();
        let probe = engine.probe();
        s.attach(Box::new(engine)).unwrap();

        let calls = probe.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], EngineCall::LoadUrl { url, .. } if url == "https://a.test"));
        assert!(matches!(
            &calls[1],
            EngineCall::EvaluateScript { script } if script.contains("window.kmpJsBridge = {")
        ));
    }

    #[test]
    fn attach_twice_fails() {
        let mut s = session(WebContent::NavigatorOnly);
        s.attach(Box::new(ScriptedEngine::push())).unwrap();
        assert!(matches!(
            s.attach(Box::new(ScriptedEngine::push())),
            Err(BridgeError::ConsumerAttached)
        ));
    }

    #[test]
    fn pump_requires_engine() {
        let mut s = session(WebContent::NavigatorOnly);
        assert!(matches!(s.pump(), Err(BridgeError::Detached)));
    }

    #[test]
    fn pre_attach_command_is_replayed() {
        let mut s = session(WebContent::NavigatorOnly);
        s.navigator().load_url("https://old.test", Headers::new());
        s.navigator().load_url("https://new.test", Headers::new());
        let engine = ScriptedEngine::push();
        let probe = engine.probe();
        s.attach(Box::new(engine)).unwrap();
        s.pump_until_idle().unwrap();
        assert_eq!(probe.loaded_urls(), vec!["https://new.test".to_string()]);
    }

    #[test]
    fn finished_load_reinjects_bootstrap() {
        let mut s = session(WebContent::NavigatorOnly);
        let engine = ScriptedEngine::push().auto_complete();
        let probe = engine.probe();
        s.attach(Box::new(engine)).unwrap();
        probe.clear_calls();

        s.navigator().load_url("https://a.test", Headers::new());
        s.pump_until_idle().unwrap();

        assert_eq!(s.snapshot().loading_state, LoadingState::Finished);
        assert_eq!(s.snapshot().current_url.as_deref(), Some("https://a.test"));
        let scripts = probe.evaluated_scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("typeof window.kmpJsBridge !== 'undefined'"));
    }

    #[test]
    fn page_message_round_trip() {
        let mut s = session(WebContent::NavigatorOnly);
        s.bridge().unwrap().register(handler_fn(
            "echo",
            |msg: &JsMessage, _: &Navigator, reply: Reply| {
                reply.send_json(&msg.param_str("text").unwrap_or_default());
            },
        ));
        let engine = ScriptedEngine::push();
        let probe = engine.probe();
        s.attach(Box::new(engine)).unwrap();
        probe.clear_calls();

        probe.post_from_page(r#"{"callbackId":0,"methodName":"echo","params":{"text":"yo"}}"#);
        s.pump_until_idle().unwrap();
        assert_eq!(
            probe.evaluated_scripts(),
            vec![r#"window.kmpJsBridge.onCallback(0, "\"yo\"");"#.to_string()]
        );
    }

    #[test]
    fn detach_clears_handlers_and_silences_replies() {
        let mut s = session(WebContent::NavigatorOnly);
        let bridge = Arc::clone(s.bridge().unwrap());
        bridge.register(handler_fn("x", |_: &JsMessage, _: &Navigator, _: Reply| {}));
        s.attach(Box::new(ScriptedEngine::push())).unwrap();
        let reply = bridge.reply_for(1);
        let token = s.cancel_handle();

        let engine = s.detach();
        assert!(engine.is_some());
        assert!(token.is_cancelled());
        assert_eq!(bridge.handler_count(), 0);
        assert!(!reply.send("1"));
        assert!(!s.navigator().has_consumer());
    }

    #[test]
    fn poll_engine_reports_initializing_until_ready() {
        let mut s = session(WebContent::NavigatorOnly);
        let engine = ScriptedEngine::poll();
        let probe = engine.probe();
        s.attach(Box::new(engine)).unwrap();

        let wait = s.poll_once();
        assert_eq!(wait, Duration::from_millis(50));
        assert_eq!(s.snapshot().loading_state, LoadingState::Initializing);

        probe.set_sample(EngineSample::Ready {
            is_loading: true,
            url: Some("https://a.test".into()),
            title: None,
            can_go_back: false,
            can_go_forward: false,
        });
        assert_eq!(s.poll_once(), Duration::from_millis(250));
        assert_eq!(s.snapshot().loading_state, LoadingState::Loading(0.1));

        probe.clear_calls();
        probe.set_sample(EngineSample::Ready {
            is_loading: false,
            url: Some("https://a.test/".into()),
            title: Some("A".into()),
            can_go_back: true,
            can_go_forward: false,
        });
        s.poll_once();
        let snap = s.snapshot();
        assert_eq!(snap.loading_state, LoadingState::Finished);
        assert_eq!(snap.page_title.as_deref(), Some("A"));
        assert!(s.navigator().can_go_back());
        assert_eq!(probe.evaluated_scripts().len(), 1);
    }

    #[test]
    fn page_start_clears_unused_skip_once_flag() {
        let nav = Navigator::with_interceptor(
            |_: &mut crate::request::WebRequest, _: &Navigator| {
                crate::request::InterceptResult::Reject
            },
        );
        let mut s = WebSession::new(nav.clone(), WebContent::NavigatorOnly);
        s.attach(Box::new(ScriptedEngine::push())).unwrap();

        // A programmatic load whose navigation callback never arrived.
        nav.mark_decided();
        s.on_signal(EngineSignal::PageStarted {
            url: Some("https://a.test".into()),
        });

        // The page's own next navigation is checked again.
        assert!(!nav.intercept_engine_navigation(crate::request::WebRequest::navigation(
            "https://b.test",
            Headers::new()
        )));
    }

    #[test]
    fn from_config_uses_bridge_name_and_initial_url() {
        let mut config = BridgeConfig::default();
        config.bridge.name = "hostBridge".into();
        config.engine.initial_url = Some("https://start.test".into());
        let mut s = WebSession::from_config(&config, Navigator::new(), WebContent::NavigatorOnly);
        let engine = ScriptedEngine::push();
        let probe = engine.probe();
        s.attach(Box::new(engine)).unwrap();
        assert_eq!(probe.loaded_urls(), vec!["https://start.test".to_string()]);
        assert!(probe.evaluated_scripts()[0].contains("window.hostBridge = {"));
    }

    #[tokio::test]
    async fn run_executes_events_until_cancelled() {
        let mut s = session(WebContent::NavigatorOnly);
        let engine = ScriptedEngine::push();
        let probe = engine.probe();
        s.attach(Box::new(engine)).unwrap();

        let nav = s.navigator().clone();
        let token = s.cancel_handle();
        let driver = async {
            nav.reload();
            nav.navigate_back();
            for _ in 0..100 {
                if probe.calls().len() >= 3 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            token.cancel();
        };
        let (result, ()) = tokio::join!(s.run(), driver);
        result.unwrap();

        let calls = probe.calls();
        assert_eq!(&calls[1..], &[EngineCall::Reload, EngineCall::GoBack]);
    }
}
