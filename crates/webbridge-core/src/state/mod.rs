//! Engine state mirror.
//!
//! Push engines and poll engines both end up as a stream of
//! [`EngineSignal`](crate::events::EngineSignal)s applied by one
//! [`StateMirror`], so observers see the same contract regardless of engine.

mod mirror;
mod poll;
mod snapshot;

pub use mirror::StateMirror;
pub use poll::PollTracker;
pub use snapshot::{EngineStateSnapshot, LoadingState};
