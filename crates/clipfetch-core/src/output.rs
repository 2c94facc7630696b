//! Atomic output files.
//!
//! Output is written to a temp file in the destination directory, synced, and
//! renamed over the final path, so a reader never observes a partial file as
//! the run's output.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Serializes `value` as pretty-printed UTF-8 JSON (two-space indent) and
/// atomically replaces `path` with it. Creates the parent directory if needed.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::env::current_dir().context("resolve current directory")?,
    };
    std::fs::create_dir_all(&parent)
        .with_context(|| format!("create output directory: {}", parent.display()))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".clipfetch-")
        .suffix(".part")
        .tempfile_in(&parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    serde_json::to_writer_pretty(tmp.as_file_mut(), value).context("serialize output JSON")?;
    tmp.as_file_mut().flush().context("flush output")?;
    tmp.as_file().sync_all().context("sync output")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("rename output into place: {}", path.display()))?;
    Ok(())
}
