//! Result aggregation: turns the unordered outcome stream into the final
//! record set and the run summary.

mod write;

pub use write::{console_summary, render_run_log, write_output, write_run_log, OutputFormat};

use chrono::{DateTime, Local, Utc};
use std::collections::HashMap;
use std::time::Duration;

use crate::clip::ClipRecord;
use crate::resolve::{OutcomeStatus, ResolutionOutcome};

/// Reason recorded for planned clips that never produced an outcome.
pub const MISSING_OUTCOME_REASON: &str = "no outcome recorded";

/// One resolved clip in the persisted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalEntry {
    pub clip_id: String,
    /// Direct media URL, or local file path in download mode.
    pub media_reference: String,
    pub created_at: DateTime<Utc>,
}

/// One unresolved clip in the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEntry {
    /// 1-based position in the planned set.
    pub index: usize,
    /// Playback URL of the clip.
    pub clip_ref: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub resolved_count: usize,
    pub attempted: usize,
    pub duration: Duration,
    /// Ordered by planned index.
    pub failures: Vec<FailureEntry>,
}

/// Everything a finished run produced. Built once by [`Aggregator::finish`].
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Resolved clips in planned order, no duplicate ids.
    pub final_set: Vec<FinalEntry>,
    pub summary: RunSummary,
    /// Status of every planned clip, in planned order.
    pub outcomes: Vec<(String, OutcomeStatus)>,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
}

/// Collects outcomes for a planned set of clips.
///
/// The first outcome for a planned id wins; later ones and outcomes for ids
/// outside the plan are ignored.
pub struct Aggregator {
    planned: Vec<ClipRecord>,
    index: HashMap<String, usize>,
    statuses: Vec<Option<OutcomeStatus>>,
    started_at: DateTime<Local>,
}

impl Aggregator {
    pub fn new(planned: &[ClipRecord], started_at: DateTime<Local>) -> Self {
        let mut index = HashMap::with_capacity(planned.len());
        for (i, clip) in planned.iter().enumerate() {
            index.entry(clip.id.clone()).or_insert(i);
        }
        Self {
            planned: planned.to_vec(),
            index,
            statuses: vec![None; planned.len()],
            started_at,
        }
    }

    /// Records one outcome. Returns false if it was ignored.
    pub fn record(&mut self, outcome: ResolutionOutcome) -> bool {
        let Some(&i) = self.index.get(&outcome.clip_id) else {
            tracing::warn!(clip = %outcome.clip_id, "ignoring outcome for unplanned clip");
            return false;
        };
        if self.statuses[i].is_some() {
            tracing::warn!(clip = %outcome.clip_id, "ignoring duplicate outcome");
            return false;
        }
        self.statuses[i] = Some(outcome.status);
        true
    }

    pub fn recorded(&self) -> usize {
        self.statuses.iter().filter(|s| s.is_some()).count()
    }

    pub fn finish(self, ended_at: DateTime<Local>, duration: Duration) -> RunReport {
        let mut final_set = Vec::new();
        let mut failures = Vec::new();
        let mut outcomes = Vec::with_capacity(self.planned.len());

        for (i, (clip, status)) in self.planned.into_iter().zip(self.statuses).enumerate() {
            let status =
                status.unwrap_or_else(|| OutcomeStatus::Failed(MISSING_OUTCOME_REASON.to_string()));
            match &status {
                OutcomeStatus::Resolved(reference) => final_set.push(FinalEntry {
                    clip_id: clip.id.clone(),
                    media_reference: reference.clone(),
                    created_at: clip.created_at,
                }),
                other => failures.push(FailureEntry {
                    index: i + 1,
                    clip_ref: clip.playback_url.clone(),
                    reason: other.failure_reason().unwrap_or_default(),
                }),
            }
            outcomes.push((clip.id, status));
        }

        let summary = RunSummary {
            resolved_count: final_set.len(),
            attempted: outcomes.len(),
            duration,
            failures,
        };
        RunReport {
            final_set,
            summary,
            outcomes,
            started_at: self.started_at,
            ended_at,
        }
    }
}
