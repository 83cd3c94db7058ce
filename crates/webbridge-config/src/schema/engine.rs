//! Options applied when an engine binding creates its native view.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// URL loaded on attach when the host supplies no initial content.
    pub initial_url: Option<String>,
    /// Custom user agent string.
    pub user_agent: Option<String>,
    /// Whether to enable dev tools (always on in debug builds).
    pub devtools: bool,
    /// Whether the view background should be transparent.
    pub transparent: bool,
    /// Whether to enable clipboard access.
    pub clipboard: bool,
    /// Whether to enable autoplay for media.
    pub autoplay: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_url: None,
            user_agent: None,
            devtools: cfg!(debug_assertions),
            transparent: false,
            clipboard: true,
            autoplay: true,
        }
    }
}
