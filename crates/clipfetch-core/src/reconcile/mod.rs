//! Reconciler for download mode.
//!
//! Converges the download directory with the planned clip set: clips whose
//! artifact already exists are skipped, and after the run every artifact whose
//! clip id is not planned is deleted. Artifacts of planned clips are never
//! touched, whether or not their fetch succeeded this run.

mod naming;

pub use naming::{artifact_file_name, parse_artifact_name, ARTIFACT_EXTENSION};

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use crate::clip::{sanitize_clip_id, ClipRecord};

/// A media file left by an earlier download run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalArtifact {
    pub clip_id: String,
    pub file_path: PathBuf,
}

/// A failed artifact deletion. Logged, never fatal.
#[derive(Debug, thiserror::Error)]
#[error("could not delete {}: {source}", path.display())]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Split of the planned clips by whether their artifact already exists.
#[derive(Debug, Default)]
pub struct ReconcilePlan {
    /// Planned clips with an artifact on disk, and its path.
    pub present: Vec<(ClipRecord, PathBuf)>,
    /// Planned clips that still need fetching.
    pub to_fetch: Vec<ClipRecord>,
}

/// Result of pruning the download directory.
#[derive(Debug, Default)]
pub struct PruneReport {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<CleanupError>,
}

/// Destination path of a clip's artifact in `dir`.
pub fn artifact_path(dir: &Path, clip: &ClipRecord) -> PathBuf {
    dir.join(artifact_file_name(clip))
}

/// Decides which planned clips need fetching. Keeps plan order in both lists.
pub fn plan_downloads(dir: &Path, clips: &[ClipRecord]) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();
    for clip in clips {
        let path = artifact_path(dir, clip);
        if path.is_file() {
            plan.present.push((clip.clone(), path));
        } else {
            plan.to_fetch.push(clip.clone());
        }
    }
    tracing::info!(
        present = plan.present.len(),
        to_fetch = plan.to_fetch.len(),
        "reconciled plan against {}",
        dir.display()
    );
    plan
}

/// Lists artifacts in `dir`. A missing directory has no artifacts; files
/// whose names are not artifact names are ignored.
pub fn scan_artifacts(dir: &Path) -> Result<Vec<LocalArtifact>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("read download dir: {}", dir.display()))
        }
    };
    let mut artifacts = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read download dir: {}", dir.display()))?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        let Some(clip_id) = name.to_str().and_then(parse_artifact_name) else {
            continue;
        };
        artifacts.push(LocalArtifact {
            clip_id,
            file_path: entry.path(),
        });
    }
    artifacts.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    Ok(artifacts)
}

/// Deletes every artifact in `dir` whose clip id is not in `planned_ids`.
///
/// Ids are compared in the form they take inside artifact names, so a planned
/// id with characters outside `[A-Za-z0-9_-]` still protects its file.
pub fn prune_unplanned(dir: &Path, planned_ids: &HashSet<String>) -> Result<PruneReport> {
    let keep: HashSet<String> = planned_ids.iter().map(|id| sanitize_clip_id(id)).collect();
    let mut report = PruneReport::default();
    for artifact in scan_artifacts(dir)? {
        if keep.contains(&artifact.clip_id) {
            continue;
        }
        match std::fs::remove_file(&artifact.file_path) {
            Ok(()) => {
                tracing::info!(clip = %artifact.clip_id, "deleted unplanned artifact {}", artifact.file_path.display());
                report.deleted.push(artifact.file_path);
            }
            Err(source) => {
                let err = CleanupError {
                    path: artifact.file_path,
                    source,
                };
                tracing::warn!("{}", err);
                report.failed.push(err);
            }
        }
    }
    Ok(report)
}
