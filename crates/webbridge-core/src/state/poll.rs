//! Signal synthesis for engines that can only be sampled.
//!
//! A poll engine reports just "loading or not", the URL and the title. The
//! tracker compares each sample with the current snapshot and emits the
//! same signals a push engine would, including a synthetic progress ramp
//! that creeps towards a ceiling while the load is in flight.

use webbridge_config::PollingConfig;

use crate::engine::EngineSample;
use crate::events::EngineSignal;

use super::snapshot::{EngineStateSnapshot, LoadingState};

#[derive(Debug, Clone)]
pub struct PollTracker {
    initial_progress: f32,
    progress_step: f32,
    progress_ceiling: f32,
}

impl PollTracker {
    pub fn new(config: &PollingConfig) -> Self {
        Self {
            initial_progress: config.initial_progress,
            progress_step: config.progress_step,
            progress_ceiling: config.progress_ceiling,
        }
    }

    /// Signals that bring `current` in line with `sample`.
    pub fn signals_for(
        &self,
        sample: &EngineSample,
        current: &EngineStateSnapshot,
    ) -> Vec<EngineSignal> {
        let EngineSample::Ready {
            is_loading,
            url,
            title,
            can_go_back,
            can_go_forward,
        } = sample
        else {
            return vec![EngineSignal::NotReady];
        };

        let url = url.clone().filter(|u| !u.trim().is_empty());
        let title = title.clone().filter(|t| !t.trim().is_empty());
        let mut signals = Vec::new();
        let mut started = false;

        if *is_loading {
            match current.loading_state {
                LoadingState::Loading(p) => {
                    let next = (p + self.progress_step).min(self.progress_ceiling).max(p);
                    signals.push(EngineSignal::ProgressChanged {
                        progress: next,
                        url: None,
                    });
                }
                LoadingState::Initializing | LoadingState::Finished => {
                    started = true;
                    signals.push(EngineSignal::PageStarted { url: url.clone() });
                    signals.push(EngineSignal::ProgressChanged {
                        progress: self.initial_progress,
                        url: None,
                    });
                }
            }
        }

        // Mid-load samples may still carry the previous page's URL.
        if !*is_loading || current.current_url.is_none() {
            if let Some(url) = url.clone() {
                if current.current_url.as_deref() != Some(url.as_str()) {
                    signals.push(EngineSignal::UrlChanged { url });
                }
            }
        }

        if let Some(title) = title {
            if started || current.page_title.as_deref() != Some(title.as_str()) {
                signals.push(EngineSignal::TitleChanged { title: Some(title) });
            }
        }

        signals.push(EngineSignal::NavigabilityChanged {
            can_go_back: *can_go_back,
            can_go_forward: *can_go_forward,
        });

        if !*is_loading && !current.loading_state.is_finished() {
            signals.push(EngineSignal::PageFinished { url });
        }

        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::Navigator;
    use crate::state::StateMirror;

    fn ready(is_loading: bool, url: &str, title: &str) -> EngineSample {
        EngineSample::Ready {
            is_loading,
            url: Some(url.into()),
            title: Some(title.into()),
            can_go_back: false,
            can_go_forward: false,
        }
    }

    fn run(samples: &[EngineSample]) -> StateMirror {
        let tracker = PollTracker::new(&PollingConfig::default());
        let mut mirror = StateMirror::new(Navigator::new());
        for sample in samples {
            for signal in tracker.signals_for(sample, mirror.snapshot()) {
                mirror.apply(signal);
            }
        }
        mirror
    }

    #[test]
    fn not_ready_maps_to_initializing() {
        let tracker = PollTracker::new(&PollingConfig::default());
        let signals = tracker.signals_for(&EngineSample::NotReady, &EngineStateSnapshot::default());
        assert_eq!(signals, vec![EngineSignal::NotReady]);
    }

    #[test]
    fn first_loading_sample_starts_with_initial_progress() {
        let m = run(&[ready(true, "https://a.test", "")]);
        assert_eq!(m.snapshot().loading_state, LoadingState::Loading(0.1));
        assert_eq!(m.snapshot().current_url.as_deref(), Some("https://a.test"));
    }

    #[test]
    fn progress_ramps_to_ceiling() {
        let samples: Vec<_> = (0..100).map(|_| ready(true, "https://a.test", "")).collect();
        let m = run(&samples);
        match m.snapshot().loading_state {
            LoadingState::Loading(p) => assert!((p - 0.9).abs() < 1e-6, "{p}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn loading_then_idle_finishes_with_final_url_and_title() {
        let m = run(&[
            ready(true, "http://a.test", ""),
            ready(true, "http://a.test", ""),
            ready(false, "https://a.test/home", "Home"),
        ]);
        let s = m.snapshot();
        assert_eq!(s.loading_state, LoadingState::Finished);
        assert_eq!(s.current_url.as_deref(), Some("https://a.test/home"));
        assert_eq!(s.page_title.as_deref(), Some("Home"));
    }

    #[test]
    fn mid_load_url_does_not_overwrite() {
        let m = run(&[
            ready(false, "https://a.test", "A"),
            ready(true, "https://a.test", ""),
            ready(true, "https://stale.test", ""),
        ]);
        assert_eq!(m.snapshot().current_url.as_deref(), Some("https://a.test"));
    }

    #[test]
    fn idle_samples_do_not_churn() {
        let tracker = PollTracker::new(&PollingConfig::default());
        let mut mirror = StateMirror::new(Navigator::new());
        for signal in tracker.signals_for(&ready(false, "https://a.test", "A"), mirror.snapshot()) {
            mirror.apply(signal);
        }
        let version = mirror.snapshot().version;
        for signal in tracker.signals_for(&ready(false, "https://a.test", "A"), mirror.snapshot()) {
            mirror.apply(signal);
        }
        assert_eq!(mirror.snapshot().version, version);
    }

    #[test]
    fn navigability_follows_every_sample() {
        let m = run(&[EngineSample::Ready {
            is_loading: true,
            url: None,
            title: None,
            can_go_back: true,
            can_go_forward: false,
        }]);
        assert!(m.snapshot().can_go_back);
    }

    #[test]
    fn recovers_after_not_ready() {
        let m = run(&[
            EngineSample::NotReady,
            EngineSample::NotReady,
            ready(false, "https://a.test", "A"),
        ]);
        assert_eq!(m.snapshot().loading_state, LoadingState::Finished);
    }
}
