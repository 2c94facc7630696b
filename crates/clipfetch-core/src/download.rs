//! Download-mode resolver: fetches each clip with an external downloader
//! (yt-dlp by default) into the download directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::clip::ClipRecord;
use crate::config::DownloaderConfig;
use crate::reconcile::artifact_path;
use crate::resolve::{ClipResolver, OutcomeStatus, ResolutionOutcome, ResolveError};

/// Runs `<program> <extra_args...> -o <dest> --continue --ignore-errors <url>`
/// once per clip. Success means the destination file exists afterwards; the
/// outcome's media reference is then that path.
#[derive(Debug, Clone)]
pub struct ExternalDownloader {
    program: String,
    extra_args: Vec<String>,
    timeout: Duration,
    dir: PathBuf,
}

impl ExternalDownloader {
    pub fn new(cfg: &DownloaderConfig, dir: impl Into<PathBuf>) -> Self {
        Self {
            program: cfg.program.clone(),
            extra_args: cfg.extra_args.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs.max(1)),
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn command(&self, dest: &Path, url: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.extra_args)
            .arg("-o")
            .arg(dest)
            .arg("--continue")
            .arg("--ignore-errors")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn fetch(&self, clip: &ClipRecord) -> Result<PathBuf, ResolveError> {
        let dest = artifact_path(&self.dir, clip);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ResolveError::Download(format!("create {}: {}", self.dir.display(), e)))?;

        tracing::debug!(clip = %clip.id, "running {} for {}", self.program, clip.playback_url);
        let output = tokio::time::timeout(self.timeout, self.command(&dest, &clip.playback_url).output())
            .await
            .map_err(|_| {
                ResolveError::Download(format!("timed out after {}s", self.timeout.as_secs()))
            })?
            .map_err(|e| ResolveError::Download(format!("could not run {}: {}", self.program, e)))?;

        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            if !output.status.success() {
                tracing::warn!(clip = %clip.id, status = %output.status, "downloader exited with error but produced the file");
            }
            return Ok(dest);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
        let reason = if last_line.is_empty() {
            format!("{} ({}), no file written", self.program, output.status)
        } else {
            format!("{} ({}): {}", self.program, output.status, last_line)
        };
        Err(ResolveError::Download(reason))
    }
}

#[async_trait]
impl ClipResolver for ExternalDownloader {
    async fn resolve(&self, clip: &ClipRecord) -> ResolutionOutcome {
        let status = match self.fetch(clip).await {
            Ok(path) => {
                tracing::info!(clip = %clip.id, "downloaded to {}", path.display());
                OutcomeStatus::Resolved(path.display().to_string())
            }
            Err(e) => {
                tracing::warn!(clip = %clip.id, "{}", e);
                e.into()
            }
        };
        ResolutionOutcome::new(clip.id.clone(), status)
    }
}
