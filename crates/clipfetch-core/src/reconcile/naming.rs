//! Deterministic artifact file names: `YYYY-MM-DD_<clip id>.mp4`.

use chrono::NaiveDate;

use crate::clip::{sanitize_clip_id, ClipRecord};

pub const ARTIFACT_EXTENSION: &str = ".mp4";

const DATE_LEN: usize = "YYYY-MM-DD".len();

/// File name for a clip's downloaded media.
pub fn artifact_file_name(clip: &ClipRecord) -> String {
    format!(
        "{}_{}{}",
        clip.created_date().format("%Y-%m-%d"),
        sanitize_clip_id(&clip.id),
        ARTIFACT_EXTENSION
    )
}

/// Clip id encoded in an artifact file name, or None if `name` is not one.
pub fn parse_artifact_name(name: &str) -> Option<String> {
    let stem = name.strip_suffix(ARTIFACT_EXTENSION)?;
    if stem.len() <= DATE_LEN + 1 || !stem.is_char_boundary(DATE_LEN) {
        return None;
    }
    let (date, rest) = stem.split_at(DATE_LEN);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let id = rest.strip_prefix('_')?;
    if id.is_empty() || sanitize_clip_id(id) != id {
        return None;
    }
    Some(id.to_string())
}
