//! Clip records and run planning.
//!
//! A `ClipRecord` is produced by the metadata supplier (or read back from a
//! clip list file) and consumed read-only by the rest of the pipeline.

mod source;
mod url_id;

pub use source::{load_clip_list, write_clip_list};
pub use url_id::{clip_id_from_url, sanitize_clip_id};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One clip as listed by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRecord {
    /// Stable clip identifier (unique within a run).
    pub id: String,
    /// Playback page for the clip. Must be a page, not a raw media URL.
    pub playback_url: String,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
}

impl ClipRecord {
    /// Calendar date (UTC) the clip was created on.
    pub fn created_date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// Filters `records` down to the planned set for a run.
///
/// Keeps clips with `view_count >= min_views`, preserving input order. When
/// the same id appears more than once only the first occurrence is kept, so
/// downstream stages can rely on ids being unique.
pub fn plan_clips<I>(records: I, min_views: u64) -> Vec<ClipRecord>
where
    I: IntoIterator<Item = ClipRecord>,
{
    let mut seen = HashSet::new();
    let mut planned = Vec::new();
    for clip in records {
        if clip.view_count < min_views {
            continue;
        }
        if !seen.insert(clip.id.clone()) {
            tracing::debug!(clip = %clip.id, "duplicate clip id in listing, keeping first");
            continue;
        }
        planned.push(clip);
    }
    planned
}

#[cfg(test)]
pub(crate) fn test_clip(id: &str, view_count: u64) -> ClipRecord {
    use chrono::TimeZone;
    ClipRecord {
        id: id.to_string(),
        playback_url: format!("https://clips.twitch.tv/{}", id),
        view_count,
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap(),
    }
}
