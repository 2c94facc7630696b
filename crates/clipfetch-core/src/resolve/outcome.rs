//! Per-clip resolution outcomes and the per-clip error taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Final status of one clip in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Media reference: a direct media URL, or a local file path in download mode.
    Resolved(String),
    Failed(String),
    TimedOut,
}

impl OutcomeStatus {
    pub fn is_resolved(&self) -> bool {
        matches!(self, OutcomeStatus::Resolved(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Resolved(_) => "resolved",
            OutcomeStatus::Failed(_) => "failed",
            OutcomeStatus::TimedOut => "timed_out",
        }
    }

    /// Human-readable failure reason (None for resolved clips).
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            OutcomeStatus::Resolved(_) => None,
            OutcomeStatus::Failed(reason) => Some(reason.clone()),
            OutcomeStatus::TimedOut => Some("No media found".to_string()),
        }
    }
}

/// Outcome for one clip. Created exactly once per clip per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    pub clip_id: String,
    pub status: OutcomeStatus,
}

impl ResolutionOutcome {
    pub fn new(clip_id: impl Into<String>, status: OutcomeStatus) -> Self {
        Self {
            clip_id: clip_id.into(),
            status,
        }
    }
}

/// Per-clip failures. None of these abort the batch; each maps onto an
/// [`OutcomeStatus`].
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The browser session could not be opened.
    #[error("browser session unavailable: {0}")]
    Session(String),
    /// The playback page failed to load (includes the navigation timeout).
    #[error("Failed to load: {0}")]
    Navigation(String),
    /// No media URL was observed within the polling bound.
    #[error("no media URL observed in time")]
    Timeout,
    /// The external downloader failed or its output could not be confirmed.
    #[error("Download failed: {0}")]
    Download(String),
}

impl From<ResolveError> for OutcomeStatus {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Timeout => OutcomeStatus::TimedOut,
            other => OutcomeStatus::Failed(other.to_string()),
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Resolved(r) => write!(f, "resolved: {}", r),
            OutcomeStatus::Failed(reason) => write!(f, "failed: {}", reason),
            OutcomeStatus::TimedOut => write!(f, "timed out"),
        }
    }
}
