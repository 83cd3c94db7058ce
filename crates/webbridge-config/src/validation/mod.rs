//! Full configuration validation.
//!
//! Collects every violation before reporting, so one pass shows the user
//! all the values that need fixing.

mod helpers;


use crate::schema::BridgeConfig;
use helpers::{is_js_identifier, validate_range_f32};
use webbridge_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &BridgeConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    if !is_js_identifier(&config.bridge.name) {
        errors.push(format!(
            "bridge.name = {:?} is not a valid JavaScript identifier",
            config.bridge.name
        ));
    }

    if config.polling.interval_ms == 0 {
        errors.push("polling.interval_ms must be greater than 0".to_string());
    }
    if config.polling.not_ready_retry_ms == 0 {
        errors.push("polling.not_ready_retry_ms must be greater than 0".to_string());
    }

    let p = &config.polling;
    validate_range_f32(&mut errors, "polling.initial_progress", p.initial_progress);
    validate_range_f32(&mut errors, "polling.progress_step", p.progress_step);
    validate_range_f32(&mut errors, "polling.progress_ceiling", p.progress_ceiling);
    if p.initial_progress > p.progress_ceiling {
        errors.push(format!(
            "polling.initial_progress = {} exceeds polling.progress_ceiling = {}",
            p.initial_progress, p.progress_ceiling
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
