use tokio::sync::watch;
use tracing::{debug, trace};

use crate::events::EngineSignal;
use crate::navigator::Navigator;

use super::snapshot::{EngineStateSnapshot, LoadingState};

/// Single writer of the [`EngineStateSnapshot`].
///
/// Each applied signal mutates the owned snapshot and, when anything
/// changed, republishes a copy to watchers.
pub struct StateMirror {
    state: EngineStateSnapshot,
    publisher: watch::Sender<EngineStateSnapshot>,
    navigator: Navigator,
}

impl StateMirror {
    pub fn new(navigator: Navigator) -> Self {
        let (publisher, _) = watch::channel(EngineStateSnapshot::default());
        Self {
            state: EngineStateSnapshot::default(),
            publisher,
            navigator,
        }
    }

    pub fn snapshot(&self) -> &EngineStateSnapshot {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineStateSnapshot> {
        self.publisher.subscribe()
    }

    /// Apply one signal. Returns `true` when this signal completed a load.
    pub fn apply(&mut self, signal: EngineSignal) -> bool {
        let before = self.state.clone();
        trace!(?signal, "state signal");

        match signal {
            EngineSignal::PageStarted { url } => self.begin_navigation(url),
            EngineSignal::ProgressChanged { progress, url } => self.progress(progress, url),
            EngineSignal::PageFinished { url } => self.finish(url),
            EngineSignal::TitleChanged { title } => self.state.page_title = title,
            EngineSignal::UrlChanged { url } => set_url(&mut self.state, Some(url)),
            EngineSignal::NavigabilityChanged {
                can_go_back,
                can_go_forward,
            } => {
                self.state.can_go_back = can_go_back;
                self.state.can_go_forward = can_go_forward;
                self.navigator.set_navigability(can_go_back, can_go_forward);
            }
            EngineSignal::ResourceError(error) => {
                debug!(
                    code = error.code,
                    main_frame = error.is_from_main_frame,
                    description = %error.description,
                    "resource error"
                );
                self.state.pending_errors.push(error);
            }
            EngineSignal::NotReady => self.state.loading_state = LoadingState::Initializing,
        }

        if self.state == before {
            return false;
        }
        self.state.version = before.version + 1;
        self.publisher.send_replace(self.state.clone());

        !before.loading_state.is_finished() && self.state.loading_state.is_finished()
    }

    fn begin_navigation(&mut self, url: Option<String>) {
        self.state.pending_errors.clear();
        self.state.page_title = None;
        self.state.loading_state = LoadingState::Loading(0.0);
        set_url(&mut self.state, url);
    }

    fn progress(&mut self, progress: f32, url: Option<String>) {
        if progress.is_nan() {
            return;
        }
        let p = progress.clamp(0.0, 1.0);
        let current = match self.state.loading_state {
            LoadingState::Loading(current) => current,
            // Late completion report for a page that already finished.
            LoadingState::Finished if p >= 1.0 => return,
            // Progress without a start signal: some engines skip it.
            LoadingState::Finished | LoadingState::Initializing => {
                self.begin_navigation(url.clone());
                0.0
            }
        };

        if p >= 1.0 {
            self.finish(url);
        } else {
            self.state.loading_state = LoadingState::Loading(current.max(p));
        }
    }

    fn finish(&mut self, url: Option<String>) {
        self.state.loading_state = LoadingState::Finished;
        set_url(&mut self.state, url);
    }
}

fn set_url(state: &mut EngineStateSnapshot, url: Option<String>) {
    if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
        state.current_url = Some(url);
    }
}
