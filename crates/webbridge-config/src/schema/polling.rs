//! State-mirror polling for engines without a callback surface.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Sampling period while the engine is ready.
    pub interval_ms: u64,
    /// Retry period while the engine binding is not constructed yet.
    pub not_ready_retry_ms: u64,
    /// Progress reported on the first sample of a navigation.
    pub initial_progress: f32,
    /// Synthetic progress added per sample while loading.
    pub progress_step: f32,
    /// Synthetic progress never exceeds this until the engine reports done.
    pub progress_ceiling: f32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 250,
            not_ready_retry_ms: 50,
            initial_progress: 0.1,
            progress_step: 0.02,
            progress_ceiling: 0.9,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn not_ready_retry(&self) -> Duration {
        Duration::from_millis(self.not_ready_retry_ms)
    }
}
