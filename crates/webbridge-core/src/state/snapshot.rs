use serde::Serialize;

use crate::events::WebViewError;

/// Page load progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[serde(tag = "state", content = "progress", rename_all = "snake_case")]
pub enum LoadingState {
    #[default]
    Initializing,
    /// Progress in `0.0..=1.0`.
    Loading(f32),
    Finished,
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading(_))
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, LoadingState::Finished)
    }
}

/// Observable engine state, owned and written by the session only.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct EngineStateSnapshot {
    pub loading_state: LoadingState,
    pub current_url: Option<String>,
    pub page_title: Option<String>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    /// Errors for the navigation in flight, cleared at each start.
    pub pending_errors: Vec<WebViewError>,
    /// Bumped on every change.
    pub version: u64,
}
