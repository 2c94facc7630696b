//! Concurrency governor.
//!
//! Keeps up to `limit` resolution workers running at once; when one finishes,
//! the next pending clip is started until the plan is exhausted. Outcomes are
//! handed to the caller's sink in completion order.

mod gauge;

pub use gauge::{ActiveGauge, GaugeGuard};

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::clip::ClipRecord;
use crate::control::StopToken;
use crate::resolve::{ClipResolver, OutcomeStatus, ResolutionOutcome};

/// Reason recorded for clips that never got a worker because the run was stopped.
pub const CANCELLED_REASON: &str = "cancelled before dispatch";

/// What the governor did during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GovernorReport {
    /// Clips handed to a worker.
    pub dispatched: usize,
    /// Clips never dispatched because of a stop request.
    pub cancelled: usize,
    /// Highest number of workers active at the same time.
    pub peak_active: usize,
}

/// Resolves every clip in `clips` with at most `limit` workers in flight.
///
/// Exactly one outcome per clip reaches `sink`. A stop request prevents new
/// dispatch; in-flight workers run to completion so their sessions are closed,
/// and each undispatched clip gets a `Failed(CANCELLED_REASON)` outcome.
/// `limit` of 0 is treated as 1.
pub async fn run_bounded<R, S>(
    clips: &[ClipRecord],
    limit: usize,
    resolver: Arc<R>,
    stop: &StopToken,
    mut sink: S,
) -> GovernorReport
where
    R: ClipResolver + ?Sized,
    S: FnMut(ResolutionOutcome),
{
    let limit = limit.max(1);
    let gauge = ActiveGauge::new();
    let mut report = GovernorReport::default();
    let mut pending = clips.iter();
    let mut join_set = JoinSet::new();

    tracing::info!(clips = clips.len(), limit, "dispatching clips");

    loop {
        while join_set.len() < limit && !stop.is_stopped() {
            let Some(clip) = pending.next() else {
                break;
            };
            let clip = clip.clone();
            let resolver = Arc::clone(&resolver);
            let gauge = Arc::clone(&gauge);
            report.dispatched += 1;
            join_set.spawn(async move {
                let _active = gauge.enter();
                match AssertUnwindSafe(resolver.resolve(&clip)).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        tracing::error!(clip = %clip.id, "resolution worker panicked");
                        ResolutionOutcome::new(
                            clip.id.clone(),
                            OutcomeStatus::Failed("worker panicked".to_string()),
                        )
                    }
                }
            });
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        match res {
            Ok(outcome) => sink(outcome),
            Err(e) => tracing::error!("resolution task join: {}", e),
        }
    }

    for clip in pending {
        report.cancelled += 1;
        sink(ResolutionOutcome::new(
            clip.id.clone(),
            OutcomeStatus::Failed(CANCELLED_REASON.to_string()),
        ));
    }
    if report.cancelled > 0 {
        tracing::warn!(cancelled = report.cancelled, "run stopped before all clips were dispatched");
    }

    report.peak_active = gauge.peak();
    report
}
