use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::clip::test_clip;

struct Env {
    _dir: tempfile::TempDir,
    root: PathBuf,
    cfg: ClipfetchConfig,
}

/// Download-mode config whose "downloader" is a shell script that writes the
/// destination file and appends one line per call to `calls.log`.
fn download_env() -> Env {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let mut cfg = ClipfetchConfig::default();
    cfg.concurrency = 2;
    cfg.output_file = Some(root.join("out.json"));
    cfg.run_log_file = root.join("run.log");
    cfg.downloader.download_dir = root.join("clips");
    cfg.downloader.program = "sh".to_string();
    cfg.downloader.extra_args = vec![
        "-c".to_string(),
        format!(
            r#"echo "$5" >> "{calls}"; case "$5" in *broken*) exit 1;; esac; echo media > "$2""#,
            calls = root.join("calls.log").display()
        ),
        "sh".to_string(),
    ];
    Env { _dir: dir, root, cfg }
}

fn write_input(root: &Path, ids: &[&str]) -> PathBuf {
    let entries: Vec<_> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "url": format!("https://clips.twitch.tv/{id}"),
                "id": id,
                "view_count": 300,
                "date": "2025-03-01",
            })
        })
        .collect();
    let path = root.join("input_clips.json");
    std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();
    path
}

fn calls(root: &Path) -> usize {
    std::fs::read_to_string(root.join("calls.log"))
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

fn files(dir: &Path) -> Vec<String> {
    let mut v: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    v.sort();
    v
}

#[tokio::test]
async fn download_run_is_idempotent_and_prunes_stale_files() {
    let env = download_env();
    let input = write_input(&env.root, &["a", "b", "c"]);
    let clips_dir = env.root.join("clips");
    std::fs::create_dir_all(&clips_dir).unwrap();
    std::fs::write(clips_dir.join("2024-01-01_stale.mp4"), b"old").unwrap();
    std::fs::write(clips_dir.join("keep-me.txt"), b"notes").unwrap();

    let ctx = RunContext::new(RunMode::Download, &env.cfg, Some(input.clone()));
    let first = run(&env.cfg, &ctx, &StopToken::new(), None).await.unwrap();
    let report = first.report.as_ref().unwrap();
    assert_eq!(report.summary.resolved_count, 3);
    assert_eq!(calls(&env.root), 3);
    assert_eq!(first.prune.as_ref().unwrap().deleted.len(), 1);
    let after_first = files(&clips_dir);
    assert_eq!(
        after_first,
        vec![
            "2025-03-01_a.mp4",
            "2025-03-01_b.mp4",
            "2025-03-01_c.mp4",
            "keep-me.txt"
        ]
    );

    let ctx = RunContext::new(RunMode::Download, &env.cfg, Some(input));
    let second = run(&env.cfg, &ctx, &StopToken::new(), None).await.unwrap();
    assert_eq!(calls(&env.root), 3, "no fetch on an unchanged plan");
    assert_eq!(second.governor.dispatched, 0);
    assert_eq!(second.report.unwrap().summary.resolved_count, 3);
    assert_eq!(files(&clips_dir), after_first);

    let out: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(env.root.join("out.json")).unwrap()).unwrap();
    assert_eq!(out.as_array().unwrap().len(), 3);
    assert_eq!(out[0]["date"], "2025-03-01");
    assert!(out[0]["url"].as_str().unwrap().ends_with("2025-03-01_a.mp4"));
}

#[tokio::test]
async fn failed_fetch_keeps_prior_artifact_of_planned_clip() {
    let env = download_env();
    let clips_dir = env.root.join("clips");
    std::fs::create_dir_all(&clips_dir).unwrap();
    // Artifact from an earlier run under a different date for the same id.
    std::fs::write(clips_dir.join("2025-02-01_broken.mp4"), b"old").unwrap();

    let input = write_input(&env.root, &["ok", "broken"]);
    let ctx = RunContext::new(RunMode::Download, &env.cfg, Some(input));
    let result = run(&env.cfg, &ctx, &StopToken::new(), None).await.unwrap();
    let report = result.report.unwrap();

    assert_eq!(report.summary.resolved_count, 1);
    assert_eq!(report.summary.failures.len(), 1);
    assert_eq!(report.summary.failures[0].index, 2);
    assert!(report.summary.failures[0].reason.starts_with("Download failed"));
    assert!(clips_dir.join("2025-02-01_broken.mp4").exists());
    assert!(result.prune.unwrap().deleted.is_empty());

    let log = std::fs::read_to_string(env.root.join("run.log")).unwrap();
    assert!(log.contains("Found media: 1 of 2\n"));
    assert!(log.contains("Errors (1):\n[2] Download failed"));
}

#[tokio::test]
async fn clips_mode_writes_plan_without_resolving() {
    let env = download_env();
    let input = write_input(&env.root, &["x", "y", "x"]);
    let ctx = RunContext::new(RunMode::Clips, &env.cfg, Some(input));
    let result = run(&env.cfg, &ctx, &StopToken::new(), None).await.unwrap();
    assert!(result.report.is_none());
    assert_eq!(result.planned, 2);
    assert_eq!(calls(&env.root), 0);
    let written = crate::clip::load_clip_list(&env.root.join("out.json")).unwrap();
    let ids: Vec<_> = written.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["x", "y"]);
}

#[tokio::test]
async fn missing_credentials_are_fatal() {
    let mut cfg = ClipfetchConfig::default();
    cfg.twitch.channel = "somechannel".to_string();
    let ctx = RunContext::new(RunMode::Urls, &cfg, None);
    let err = run(&cfg, &ctx, &StopToken::new(), None).await.unwrap_err();
    assert!(format!("{:#}", err).contains("fetch clip metadata"));
}

#[tokio::test]
async fn run_is_recorded_in_ledger() {
    let env = download_env();
    let input = write_input(&env.root, &["a"]);
    let ledger = RunLedger::open_at(env.root.join("state").join("runs.db"))
        .await
        .unwrap();
    let ctx = RunContext::new(RunMode::Download, &env.cfg, Some(input));
    let result = run(&env.cfg, &ctx, &StopToken::new(), Some(&ledger))
        .await
        .unwrap();
    let runs = ledger.list_runs(5).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(Some(runs[0].id), result.run_id);
    assert_eq!(runs[0].mode, "download");
    assert_eq!(runs[0].resolved, 1);
}

struct Counting {
    calls: AtomicUsize,
}

#[async_trait]
impl ClipResolver for Counting {
    async fn resolve(&self, clip: &ClipRecord) -> ResolutionOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ResolutionOutcome::new(
            clip.id.clone(),
            OutcomeStatus::Resolved(format!("https://m/{}.mp4", clip.id)),
        )
    }
}

#[tokio::test]
async fn preresolved_clips_are_not_dispatched() {
    let planned = vec![test_clip("a", 300), test_clip("b", 300), test_clip("c", 300)];
    let to_fetch = vec![planned[0].clone(), planned[2].clone()];
    let pre = vec![ResolutionOutcome::new(
        "b",
        OutcomeStatus::Resolved("/clips/2025-03-01_b.mp4".to_string()),
    )];
    let resolver = Arc::new(Counting {
        calls: AtomicUsize::new(0),
    });
    let ctx = RunContext::new(RunMode::Download, &ClipfetchConfig::default(), None);

    let (report, governor) = resolve_planned(
        &planned,
        &to_fetch,
        pre,
        Arc::clone(&resolver),
        4,
        &StopToken::new(),
        &ctx,
    )
    .await;
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    assert_eq!(governor.dispatched, 2);
    let refs: Vec<_> = report
        .final_set
        .iter()
        .map(|e| e.media_reference.as_str())
        .collect();
    assert_eq!(
        refs,
        vec!["https://m/a.mp4", "/clips/2025-03-01_b.mp4", "https://m/c.mp4"]
    );
}

#[tokio::test]
async fn stopped_run_reports_cancelled_clips() {
    let planned: Vec<_> = (0..4).map(|i| test_clip(&format!("c{i}"), 300)).collect();
    let stop = StopToken::new();
    stop.request_stop();
    let resolver = Arc::new(Counting {
        calls: AtomicUsize::new(0),
    });
    let ctx = RunContext::new(RunMode::Urls, &ClipfetchConfig::default(), None);
    let (report, governor) =
        resolve_planned(&planned, &planned, Vec::new(), resolver, 2, &stop, &ctx).await;
    assert_eq!(governor.cancelled, 4);
    assert_eq!(report.summary.resolved_count, 0);
    assert!(report
        .summary
        .failures
        .iter()
        .all(|f| f.reason == crate::governor::CANCELLED_REASON));
}
