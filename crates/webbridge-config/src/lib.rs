//! Bridge configuration.
//!
//! TOML-based configuration for the web bridge: in-page bootstrap object
//! name, state-mirror polling cadence, engine creation options and
//! logging. All sections use serde defaults so partial configs work.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use webbridge_config::load_config;
//!
//! let config = load_config().expect("failed to load config");
//! println!("bridge object: window.{}", config.bridge.name);
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    BridgeConfig, BridgeSection, EngineConfig, LogLevel, LoggingConfig, PollingConfig,
    CONFIG_SCHEMA_VERSION, DEFAULT_BRIDGE_NAME,
};
pub use toml_loader::{create_default_config, default_config_path, load_default, load_from_path};

use webbridge_common::ConfigError;

/// Load config from the platform default path and validate it.
pub fn load_config() -> Result<BridgeConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &BridgeConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let json = config_to_json(&BridgeConfig::default());
        assert!(json.contains("\"bridge\""));
        assert!(json.contains("\"polling\""));
        assert!(json.contains("\"engine\""));
        assert!(json.contains("\"logging\""));
        assert!(json.contains("\"kmpJsBridge\""));
    }

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let json = config_to_json(&BridgeConfig::default());
        let parsed: BridgeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.bridge.name, DEFAULT_BRIDGE_NAME);
        assert_eq!(parsed.polling.interval_ms, 250);
    }
}
