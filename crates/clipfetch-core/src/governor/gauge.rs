//! Active-worker gauge.
//!
//! Each worker holds a [`GaugeGuard`] while it runs, so the gauge reflects
//! how many workers are in flight and remembers the highest value seen.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ActiveGauge {
    in_use: AtomicUsize,
    peak: AtomicUsize,
}

impl ActiveGauge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Workers currently active.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    /// Highest number of simultaneously active workers observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    /// Mark one worker active until the returned guard is dropped.
    pub fn enter(self: &Arc<Self>) -> GaugeGuard {
        let now = self.in_use.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        GaugeGuard {
            gauge: Arc::clone(self),
        }
    }
}

/// Decrements the gauge when dropped.
pub struct GaugeGuard {
    gauge: Arc<ActiveGauge>,
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.gauge.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}
