//! Run-scoped state handed to every stage of a run.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::ClipfetchConfig;

/// What a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Resolve clips to direct media URLs with the browser.
    #[default]
    Urls,
    /// Fetch clips into the download directory and prune stale files.
    Download,
    /// Only list and filter clips, writing a clip list file.
    Clips,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Urls => "urls",
            RunMode::Download => "download",
            RunMode::Clips => "clips",
        }
    }

    fn output_suffix(&self) -> &'static str {
        match self {
            RunMode::Urls => "mp4_urls",
            RunMode::Download => "downloads",
            RunMode::Clips => "clips",
        }
    }
}

/// Explicit state for one run. Created at start, dropped after the results
/// are written.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub mode: RunMode,
    /// Clip list file to read instead of calling the platform API.
    pub input: Option<PathBuf>,
    pub output_path: PathBuf,
    pub run_log_path: PathBuf,
    pub download_dir: PathBuf,
    pub started: Instant,
    pub started_at: DateTime<Local>,
}

impl RunContext {
    pub fn new(mode: RunMode, cfg: &ClipfetchConfig, input: Option<PathBuf>) -> Self {
        let output_path = cfg
            .output_file
            .clone()
            .unwrap_or_else(|| default_output_path(mode, &cfg.twitch.channel, input.as_deref()));
        Self {
            mode,
            input,
            output_path,
            run_log_path: cfg.run_log_file.clone(),
            download_dir: cfg.downloader.download_dir.clone(),
            started: Instant::now(),
            started_at: Local::now(),
        }
    }
}

/// `<channel>_<suffix>.json`; falls back to the input file stem, then to
/// `clipfetch`, when no channel is configured.
fn default_output_path(mode: RunMode, channel: &str, input: Option<&Path>) -> PathBuf {
    let channel = channel.trim();
    let prefix = if !channel.is_empty() {
        channel.to_string()
    } else {
        input
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .map(|s| s.trim_end_matches("_clips").to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "clipfetch".to_string())
    };
    PathBuf::from(format!("{}_{}.json", prefix, mode.output_suffix()))
}
