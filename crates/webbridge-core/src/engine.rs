//! The seam between the bridge and a concrete browser engine.
//!
//! An [`EngineBinding`] wraps one native engine instance. The session calls
//! into it from a single owner context; engines report back either by
//! pushing [`EngineSignal`]s (callback engines) or by answering
//! [`EngineBinding::sample`] (poll engines).

use serde::Serialize;
use webbridge_common::EngineError;

use crate::bootstrap::MessageTransport;
use crate::content::{FileSource, HtmlData};
use crate::events::EngineSignal;
use crate::navigator::ScriptCallback;
use crate::request::Headers;

/// One observation of a poll-only engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EngineSample {
    /// The native view does not exist yet.
    NotReady,
    Ready {
        is_loading: bool,
        url: Option<String>,
        title: Option<String>,
        can_go_back: bool,
        can_go_forward: bool,
    },
}

/// Native engine operations. Called only from the owning session, so
/// implementations may wrap thread-bound handles.
pub trait EngineBinding {
    fn load_url(&self, url: &str, headers: &Headers) -> Result<(), EngineError>;

    fn load_html(&self, data: &HtmlData) -> Result<(), EngineError>;

    fn load_file(&self, path: &str, source: FileSource) -> Result<(), EngineError>;

    fn go_back(&self) -> Result<(), EngineError>;

    fn go_forward(&self) -> Result<(), EngineError>;

    fn reload(&self) -> Result<(), EngineError>;

    fn stop_loading(&self) -> Result<(), EngineError>;

    /// Run `script` in the page. The callback, when given, receives the
    /// result as JSON text.
    fn evaluate_script(
        &self,
        script: &str,
        callback: Option<ScriptCallback>,
    ) -> Result<(), EngineError>;

    fn can_go_back(&self) -> bool;

    fn can_go_forward(&self) -> bool;

    /// Channel the page uses to post messages to the host.
    fn message_transport(&self) -> MessageTransport;

    /// Whether loads started through this binding are also reported to
    /// [`Navigator::intercept_engine_navigation`](crate::Navigator::intercept_engine_navigation).
    fn reports_programmatic_navigations(&self) -> bool {
        false
    }

    /// Current engine state for poll-driven mirroring. `None` means the
    /// engine pushes signals instead.
    fn sample(&self) -> Option<EngineSample> {
        None
    }

    /// Lifecycle signals pushed since the last call.
    fn take_signals(&mut self) -> Vec<EngineSignal> {
        Vec::new()
    }

    /// Raw page messages received since the last call.
    fn drain_ipc_messages(&mut self) -> Vec<String> {
        Vec::new()
    }
}
