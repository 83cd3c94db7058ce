//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod engine;
mod polling;
mod system;

pub use engine::EngineConfig;
pub use polling::PollingConfig;
pub use system::{LogLevel, LoggingConfig};

use serde::{Deserialize, Serialize};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Name of the in-page bridge object when none is configured.
pub const DEFAULT_BRIDGE_NAME: &str = "kmpJsBridge";

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    pub bridge: BridgeSection,
    pub polling: PollingConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// In-page bridge object settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    /// Identifier of the `window.<name>` object used for call-out,
    /// callback storage and the transport hook.
    pub name: String,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            name: DEFAULT_BRIDGE_NAME.to_string(),
        }
    }
}
