//! CLI for clipfetch.

mod commands;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use clipfetch_core::config::{self, ClipfetchConfig};
use clipfetch_core::pipeline::RunMode;
use std::path::PathBuf;

use commands::{run_clips, run_history};

/// Resolve Twitch clips to direct media URLs, or download them.
#[derive(Debug, Parser)]
#[command(name = "clipfetch")]
#[command(about = "clipfetch: resolve Twitch clips to direct mp4 links", long_about = None)]
pub struct Cli {
    /// What to produce: media URLs (default), downloaded files, or a clip list.
    #[arg(value_enum)]
    pub mode: Option<ModeArg>,

    #[command(flatten)]
    pub overrides: Overrides,

    /// Print recent runs from the run ledger and exit.
    #[arg(long)]
    pub history: bool,

    /// Number of runs shown by --history.
    #[arg(long, default_value = "10", value_name = "N", requires = "history")]
    pub limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Urls,
    Download,
    Clips,
}

impl From<ModeArg> for RunMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Urls => RunMode::Urls,
            ModeArg::Download => RunMode::Download,
            ModeArg::Clips => RunMode::Clips,
        }
    }
}

/// Flags that override values from `config.toml` for one run.
#[derive(Debug, Default, clap::Args)]
pub struct Overrides {
    /// Read clips from this JSON clip list instead of the Twitch API.
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Twitch channel login to list clips for.
    #[arg(long)]
    pub channel: Option<String>,

    /// Minimum view count for a clip to be planned.
    #[arg(long, value_name = "N")]
    pub min_views: Option<u64>,

    /// Only list clips from the last N days.
    #[arg(long, value_name = "N")]
    pub days_back: Option<i64>,

    /// Maximum number of clips resolved at once.
    #[arg(long, short = 'c', value_name = "N")]
    pub concurrency: Option<usize>,

    /// Output JSON file.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory for downloaded clips (download mode).
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,
}

impl Overrides {
    pub fn apply(&self, cfg: &mut ClipfetchConfig) {
        if let Some(channel) = &self.channel {
            cfg.twitch.channel = channel.clone();
        }
        if let Some(n) = self.min_views {
            cfg.twitch.min_views = n;
        }
        if let Some(n) = self.days_back {
            cfg.twitch.days_back = n;
        }
        if let Some(n) = self.concurrency {
            cfg.concurrency = n;
        }
        if let Some(path) = &self.output {
            cfg.output_file = Some(path.clone());
        }
        if let Some(dir) = &self.download_dir {
            cfg.downloader.download_dir = dir.clone();
        }
    }
}

/// What the parsed arguments ask for.
#[derive(Debug, PartialEq, Eq)]
pub enum CliCommand {
    Run(RunMode),
    History { limit: u32 },
}

impl Cli {
    pub fn command(&self) -> CliCommand {
        if self.history {
            CliCommand::History { limit: self.limit }
        } else {
            CliCommand::Run(self.mode.map(RunMode::from).unwrap_or_default())
        }
    }

    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        cli.overrides.apply(&mut cfg);
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command() {
            CliCommand::Run(mode) => run_clips(&cfg, mode, cli.overrides.input.clone()).await?,
            CliCommand::History { limit } => run_history(limit).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
