//! Run control: a shared stop token for interrupting a run.
//!
//! The CLI's Ctrl-C handler calls `request_stop`; the governor checks the
//! token before dispatching each clip. Work already in flight is never
//! aborted, so every open browser session is closed by its own worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable stop flag shared between a signal handler and the governor.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop dispatching new clips.
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}
