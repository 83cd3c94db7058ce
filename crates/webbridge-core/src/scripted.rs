//! An in-process engine binding that records what it is asked to do.
//!
//! Used by the demo binary and by tests. It loads nothing; every call is
//! appended to a shared log that a [`ScriptedProbe`] can read while the
//! engine itself is owned by a session. The probe can also play the page:
//! post raw bridge messages, push lifecycle signals, or set what the next
//! poll sample returns.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use webbridge_common::EngineError;

use crate::bootstrap::MessageTransport;
use crate::content::{FileSource, HtmlData};
use crate::engine::{EngineBinding, EngineSample};
use crate::events::EngineSignal;
use crate::history::HistoryTracker;
use crate::navigator::ScriptCallback;
use crate::request::Headers;

/// One recorded call into the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum EngineCall {
    LoadUrl { url: String, headers: Headers },
    LoadHtml { html: String, base_url: Option<String> },
    LoadFile { path: String, source: FileSource },
    GoBack,
    GoForward,
    Reload,
    StopLoading,
    EvaluateScript { script: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Push,
    Poll,
}

#[derive(Default)]
struct Shared {
    calls: Vec<EngineCall>,
    page_messages: VecDeque<String>,
    signals: Vec<EngineSignal>,
    sample: Option<EngineSample>,
    history: HistoryTracker,
    fail_next: Option<String>,
    auto_complete: bool,
}

/// Recording engine binding.
pub struct ScriptedEngine {
    mode: Mode,
    transport: MessageTransport,
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedEngine {
    /// An engine that pushes lifecycle signals.
    pub fn push() -> Self {
        Self::with_mode(Mode::Push)
    }

    /// An engine that must be sampled. Starts not ready.
    pub fn poll() -> Self {
        let engine = Self::with_mode(Mode::Poll);
        engine.lock().sample = Some(EngineSample::NotReady);
        engine
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            transport: MessageTransport::Ipc,
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    pub fn with_transport(mut self, transport: MessageTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Complete every load immediately, as a page with no subresources
    /// would: push engines report start and finish, poll engines sample
    /// as idle on the loaded URL.
    pub fn auto_complete(self) -> Self {
        self.lock().auto_complete = true;
        self
    }

    pub fn probe(&self) -> ScriptedProbe {
        ScriptedProbe {
            shared: Arc::clone(&self.shared),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        lock(&self.shared)
    }

    fn record(&self, call: EngineCall) -> Result<(), EngineError> {
        let mut shared = self.lock();
        if let Some(reason) = shared.fail_next.take() {
            return Err(EngineError::Native(reason));
        }
        shared.calls.push(call);
        Ok(())
    }

    fn visited(&self, url: String) {
        let mut shared = self.lock();
        shared.history.visit(&url);
        if !shared.auto_complete {
            return;
        }
        let (can_go_back, can_go_forward) =
            (shared.history.can_go_back(), shared.history.can_go_forward());
        match self.mode {
            Mode::Push => {
                shared.signals.push(EngineSignal::PageStarted {
                    url: Some(url.clone()),
                });
                shared.signals.push(EngineSignal::NavigabilityChanged {
                    can_go_back,
                    can_go_forward,
                });
                shared
                    .signals
                    .push(EngineSignal::PageFinished { url: Some(url) });
            }
            Mode::Poll => {
                shared.sample = Some(EngineSample::Ready {
                    is_loading: false,
                    url: Some(url),
                    title: None,
                    can_go_back,
                    can_go_forward,
                });
            }
        }
    }

    fn step_history(&self, back: bool) {
        let target = {
            let shared = self.lock();
            let target = if back {
                shared.history.peek_back()
            } else {
                shared.history.peek_forward()
            };
            target.map(str::to_string)
        };
        if let Some(url) = target {
            self.visited(url);
        }
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EngineBinding for ScriptedEngine {
    fn load_url(&self, url: &str, headers: &Headers) -> Result<(), EngineError> {
        self.record(EngineCall::LoadUrl {
            url: url.to_string(),
            headers: headers.clone(),
        })?;
        self.visited(url.to_string());
        Ok(())
    }

    fn load_html(&self, data: &HtmlData) -> Result<(), EngineError> {
        self.record(EngineCall::LoadHtml {
            html: data.html.clone(),
            base_url: data.base_url.clone(),
        })?;
        let url = data
            .history_url
            .clone()
            .or_else(|| data.base_url.clone())
            .unwrap_or_else(|| "about:blank".to_string());
        self.visited(url);
        Ok(())
    }

    fn load_file(&self, path: &str, source: FileSource) -> Result<(), EngineError> {
        self.record(EngineCall::LoadFile {
            path: path.to_string(),
            source,
        })?;
        self.visited(format!("file://{}", path.trim_start_matches('/')));
        Ok(())
    }

    fn go_back(&self) -> Result<(), EngineError> {
        self.record(EngineCall::GoBack)?;
        self.step_history(true);
        Ok(())
    }

    fn go_forward(&self) -> Result<(), EngineError> {
        self.record(EngineCall::GoForward)?;
        self.step_history(false);
        Ok(())
    }

    fn reload(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Reload)
    }

    fn stop_loading(&self) -> Result<(), EngineError> {
        self.record(EngineCall::StopLoading)
    }

    fn evaluate_script(
        &self,
        script: &str,
        callback: Option<ScriptCallback>,
    ) -> Result<(), EngineError> {
        self.record(EngineCall::EvaluateScript {
            script: script.to_string(),
        })?;
        if let Some(callback) = callback {
            callback("null".to_string());
        }
        Ok(())
    }

    fn can_go_back(&self) -> bool {
        self.lock().history.can_go_back()
    }

    fn can_go_forward(&self) -> bool {
        self.lock().history.can_go_forward()
    }

    fn message_transport(&self) -> MessageTransport {
        self.transport.clone()
    }

    fn sample(&self) -> Option<EngineSample> {
        match self.mode {
            Mode::Push => None,
            Mode::Poll => self.lock().sample.clone(),
        }
    }

    fn take_signals(&mut self) -> Vec<EngineSignal> {
        std::mem::take(&mut self.lock().signals)
    }

    fn drain_ipc_messages(&mut self) -> Vec<String> {
        self.lock().page_messages.drain(..).collect()
    }
}

/// Observer and puppeteer for a [`ScriptedEngine`].
#[derive(Clone)]
pub struct ScriptedProbe {
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedProbe {
    pub fn calls(&self) -> Vec<EngineCall> {
        lock(&self.shared).calls.clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.shared).calls.clear();
    }

    /// URLs passed to `load_url`, in order.
    pub fn loaded_urls(&self) -> Vec<String> {
        lock(&self.shared)
            .calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::LoadUrl { url, .. } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// Scripts passed to `evaluate_script`, in order.
    pub fn evaluated_scripts(&self) -> Vec<String> {
        lock(&self.shared)
            .calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::EvaluateScript { script } => Some(script.clone()),
                _ => None,
            })
            .collect()
    }

    /// Queue raw text as if the page had posted it.
    pub fn post_from_page(&self, raw: impl Into<String>) {
        lock(&self.shared).page_messages.push_back(raw.into());
    }

    pub fn push_signal(&self, signal: EngineSignal) {
        lock(&self.shared).signals.push(signal);
    }

    pub fn set_sample(&self, sample: EngineSample) {
        lock(&self.shared).sample = Some(sample);
    }

    /// Make the next engine call fail with `reason` instead of recording.
    pub fn fail_next_call(&self, reason: impl Into<String>) {
        lock(&self.shared).fail_next = Some(reason.into());
    }
}
