//! Persisted run artifacts: the output JSON and the plain-text run log.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

use super::RunReport;
use crate::output::write_json_atomic;

/// Shape of the output JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `["https://...mp4", ...]`
    BareUrls,
    /// `[{"url": ..., "date": "YYYY-MM-DD"}, ...]`
    Dated,
}

#[derive(Serialize)]
struct DatedEntry<'a> {
    url: &'a str,
    date: String,
}

/// Writes the final set to `path` atomically, in planned order.
pub fn write_output(path: &Path, report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::BareUrls => {
            let urls: Vec<&str> = report
                .final_set
                .iter()
                .map(|e| e.media_reference.as_str())
                .collect();
            write_json_atomic(path, &urls)
        }
        OutputFormat::Dated => {
            let entries: Vec<DatedEntry<'_>> = report
                .final_set
                .iter()
                .map(|e| DatedEntry {
                    url: &e.media_reference,
                    date: e.created_at.date_naive().format("%Y-%m-%d").to_string(),
                })
                .collect();
            write_json_atomic(path, &entries)
        }
    }
}

fn log_time(t: &chrono::DateTime<chrono::Local>) -> String {
    t.format("%d.%m.%Y %H:%M:%S").to_string()
}

fn duration_secs(report: &RunReport) -> String {
    format!("{:.1}", report.summary.duration.as_secs_f64())
}

/// Run log text. The file is overwritten on every run.
pub fn render_run_log(report: &RunReport) -> String {
    let s = &report.summary;
    let mut out = String::new();
    let _ = writeln!(out, "Start: {}", log_time(&report.started_at));
    let _ = writeln!(out, "End: {}", log_time(&report.ended_at));
    let _ = writeln!(out, "Duration: {} seconds", duration_secs(report));
    let _ = writeln!(out, "Found media: {} of {}", s.resolved_count, s.attempted);
    if !s.failures.is_empty() {
        let _ = writeln!(out, "\nErrors ({}):", s.failures.len());
        for f in &s.failures {
            let _ = writeln!(out, "[{}] {}: {}", f.index, f.reason, f.clip_ref);
        }
    }
    out
}

pub fn write_run_log(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create run log directory: {}", parent.display()))?;
    }
    std::fs::write(path, render_run_log(report))
        .with_context(|| format!("write run log: {}", path.display()))
}

/// Short summary printed to the console at the end of a run.
pub fn console_summary(report: &RunReport) -> String {
    format!(
        "Done! Found {} of {} media links.\nDuration: {} seconds",
        report.summary.resolved_count,
        report.summary.attempted,
        duration_secs(report)
    )
}
