//! Clip list files: the `clips` mode output, readable as run input.
//!
//! Accepts an array of bare playback URL strings or of objects with at least
//! a `url` field. Objects may carry `id`, `view_count` and either an RFC 3339
//! `created_at` or a `date` (`YYYY-MM-DD`).

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{clip_id_from_url, ClipRecord};
use crate::output::write_json_atomic;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListEntry {
    Url(String),
    Record(RecordEntry),
}

#[derive(Debug, Deserialize)]
struct RecordEntry {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct WrittenEntry<'a> {
    url: &'a str,
    id: &'a str,
    view_count: u64,
    date: String,
    created_at: DateTime<Utc>,
}

/// Creation time used for entries that carry no date. Fixed so artifact names
/// stay stable between runs.
fn undated() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().unwrap_or_default()
}

/// Reads a clip list file. Entries without a usable URL or id are skipped with
/// a warning; nulls are ignored.
pub fn load_clip_list(path: &Path) -> Result<Vec<ClipRecord>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read clip list: {}", path.display()))?;
    let entries: Vec<Option<ListEntry>> = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse clip list JSON: {}", path.display()))?;

    let mut clips = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let Some(entry) = entry else { continue };
        match entry_to_record(entry) {
            Some(clip) => clips.push(clip),
            None => tracing::warn!(index, "skipping clip list entry without usable url"),
        }
    }
    Ok(clips)
}

fn entry_to_record(entry: ListEntry) -> Option<ClipRecord> {
    let (url, id, view_count, created_at) = match entry {
        ListEntry::Url(url) => (url, None, 0, undated()),
        ListEntry::Record(r) => {
            let created_at = r
                .created_at
                .or_else(|| {
                    r.date
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|dt| dt.and_utc())
                })
                .unwrap_or_else(undated);
            (r.url?, r.id, r.view_count.unwrap_or(0), created_at)
        }
    };
    let url = url.trim().to_string();
    if url.is_empty() {
        return None;
    }
    let id = match id.filter(|s| !s.trim().is_empty()) {
        Some(id) => super::sanitize_clip_id(id.trim()),
        None => clip_id_from_url(&url)?,
    };
    Some(ClipRecord {
        id,
        playback_url: url,
        view_count,
        created_at,
    })
}

/// Writes the planned clips as a clip list file (atomically).
pub fn write_clip_list(path: &Path, clips: &[ClipRecord]) -> Result<()> {
    let entries: Vec<WrittenEntry<'_>> = clips
        .iter()
        .map(|c| WrittenEntry {
            url: &c.playback_url,
            id: &c.id,
            view_count: c.view_count,
            date: c.created_date().format("%Y-%m-%d").to_string(),
            created_at: c.created_at,
        })
        .collect();
    write_json_atomic(path, &entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::test_clip;

    fn write_tmp(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let p = dir.path().join("clips.json");
        std::fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn loads_bare_urls_and_objects() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_tmp(
            &dir,
            r#"[
                "https://clips.twitch.tv/FirstSlug",
                null,
                {"url": "https://clips.twitch.tv/SecondSlug", "date": "2025-03-01", "view_count": 12},
                {"id": "no-url"},
                {"url": "  "}
            ]"#,
        );
        let clips = load_clip_list(&p).unwrap();
        assert_eq!(clips.len(), 2);
        assert_eq!(clips[0].id, "FirstSlug");
        assert_eq!(clips[0].created_date().to_string(), "1970-01-01");
        assert_eq!(clips[1].id, "SecondSlug");
        assert_eq!(clips[1].view_count, 12);
        assert_eq!(clips[1].created_date().to_string(), "2025-03-01");
    }

    #[test]
    fn written_list_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("out.json");
        let clips = vec![test_clip("alpha", 300), test_clip("beta", 260)];
        write_clip_list(&p, &clips).unwrap();
        let back = load_clip_list(&p).unwrap();
        assert_eq!(back, clips);
    }

    #[test]
    fn invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_tmp(&dir, "{not json");
        assert!(load_clip_list(&p).is_err());
    }
}
