//! Row types returned by the run ledger.

/// One recorded run, as listed by `--history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEntry {
    pub id: i64,
    /// `urls`, `download` or `clips`.
    pub mode: String,
    /// Unix seconds.
    pub started_at: i64,
    pub ended_at: i64,
    pub duration_ms: i64,
    pub attempted: i64,
    pub resolved: i64,
    pub output_path: Option<String>,
}

impl RunEntry {
    pub fn failed(&self) -> i64 {
        self.attempted - self.resolved
    }
}

/// Stored status of one clip within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRow {
    pub position: i64,
    pub clip_id: String,
    /// `resolved`, `failed` or `timed_out`.
    pub status: String,
    /// Media reference for resolved clips, failure reason otherwise.
    pub detail: Option<String>,
}
