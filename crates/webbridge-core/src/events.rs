//! Engine lifecycle signals.

use serde::{Deserialize, Serialize};

/// A failed resource load reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebViewError {
    pub code: i32,
    pub description: String,
    pub is_from_main_frame: bool,
}

/// What an engine reports about its page, in the order it happened.
///
/// Push engines emit these from their native callbacks; poll engines have
/// them synthesized from periodic samples. Either way they feed the same
/// [`StateMirror`](crate::state::StateMirror).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineSignal {
    PageStarted {
        url: Option<String>,
    },
    ProgressChanged {
        progress: f32,
        url: Option<String>,
    },
    PageFinished {
        url: Option<String>,
    },
    TitleChanged {
        title: Option<String>,
    },
    UrlChanged {
        url: String,
    },
    NavigabilityChanged {
        can_go_back: bool,
        can_go_forward: bool,
    },
    ResourceError(WebViewError),
    /// The native view is not constructed yet.
    NotReady,
}
