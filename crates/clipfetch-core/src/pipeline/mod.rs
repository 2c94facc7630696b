//! One complete run: gather clips, plan, resolve with bounded concurrency,
//! reconcile (download mode), aggregate and persist.

mod context;

pub use context::{RunContext, RunMode};

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use crate::aggregate::{
    console_summary, write_output, write_run_log, Aggregator, OutputFormat, RunReport,
};
use crate::clip::{load_clip_list, plan_clips, write_clip_list, ClipRecord};
use crate::config::ClipfetchConfig;
use crate::control::StopToken;
use crate::download::ExternalDownloader;
use crate::governor::{run_bounded, GovernorReport};
use crate::ledger::RunLedger;
use crate::reconcile::{plan_downloads, prune_unplanned, PruneReport};
use crate::resolve::{
    BrowserResolver, ChromiumBrowser, ClipResolver, MediaMatcher, OutcomeStatus,
    ResolutionOutcome, ResolveTiming,
};
use crate::supplier;

/// What a run did. `report` is None in clips mode.
#[derive(Debug)]
pub struct RunResult {
    pub mode: RunMode,
    pub planned: usize,
    pub report: Option<RunReport>,
    pub governor: GovernorReport,
    pub prune: Option<PruneReport>,
    /// Ledger id of the run, if it was recorded.
    pub run_id: Option<i64>,
}

impl RunResult {
    /// Line(s) printed to the console at the end of the run.
    pub fn console_summary(&self, ctx: &RunContext) -> String {
        match &self.report {
            Some(report) => console_summary(report),
            None => format!(
                "{} clips saved to {}",
                self.planned,
                ctx.output_path.display()
            ),
        }
    }
}

/// Builds the planned set from the clip list file or the platform API.
///
/// A clip list file is already a plan, so it is not filtered by view count
/// again. Supplier auth failures are fatal; listing failures only cut the
/// listing short.
pub async fn gather_planned(cfg: &ClipfetchConfig, ctx: &RunContext) -> Result<Vec<ClipRecord>> {
    let planned = match &ctx.input {
        Some(path) => {
            let clips = load_clip_list(path)?;
            tracing::info!(clips = clips.len(), "loaded clip list from {}", path.display());
            plan_clips(clips, 0)
        }
        None => {
            let listing = supplier::fetch_clips(&cfg.twitch, Utc::now())
                .await
                .context("fetch clip metadata")?;
            if let Some(err) = &listing.stopped_early {
                tracing::warn!("clip listing stopped early, keeping {} clips: {}", listing.clips.len(), err);
            }
            plan_clips(listing.clips, cfg.twitch.min_views)
        }
    };
    tracing::info!(planned = planned.len(), mode = ctx.mode.as_str(), "planned run");
    Ok(planned)
}

/// Runs `clips` through `resolver` and collects every outcome, including the
/// `preresolved` ones (clips already satisfied without a fetch).
pub async fn resolve_planned<R>(
    planned: &[ClipRecord],
    clips: &[ClipRecord],
    preresolved: Vec<ResolutionOutcome>,
    resolver: Arc<R>,
    concurrency: usize,
    stop: &StopToken,
    ctx: &RunContext,
) -> (RunReport, GovernorReport)
where
    R: ClipResolver + ?Sized,
{
    let mut aggregator = Aggregator::new(planned, ctx.started_at);
    for outcome in preresolved {
        aggregator.record(outcome);
    }
    let governor = run_bounded(clips, concurrency, resolver, stop, |outcome| {
        aggregator.record(outcome);
    })
    .await;
    let report = aggregator.finish(Local::now(), ctx.started.elapsed());
    (report, governor)
}

/// Executes one run described by `ctx`.
pub async fn run(
    cfg: &ClipfetchConfig,
    ctx: &RunContext,
    stop: &StopToken,
    ledger: Option<&RunLedger>,
) -> Result<RunResult> {
    let planned = gather_planned(cfg, ctx).await?;

    let (report, governor, prune) = match ctx.mode {
        RunMode::Clips => {
            write_clip_list(&ctx.output_path, &planned)?;
            tracing::info!(clips = planned.len(), "wrote clip list to {}", ctx.output_path.display());
            return Ok(RunResult {
                mode: ctx.mode,
                planned: planned.len(),
                report: None,
                governor: GovernorReport::default(),
                prune: None,
                run_id: None,
            });
        }
        RunMode::Urls => {
            let (report, governor) = run_browser(cfg, ctx, &planned, stop).await?;
            (report, governor, None)
        }
        RunMode::Download => {
            let (report, governor, prune) = run_download(cfg, ctx, &planned, stop).await?;
            (report, governor, Some(prune))
        }
    };

    let format = if ctx.mode == RunMode::Download || cfg.dated_output {
        OutputFormat::Dated
    } else {
        OutputFormat::BareUrls
    };
    write_output(&ctx.output_path, &report, format)?;
    write_run_log(&ctx.run_log_path, &report)?;
    tracing::info!(
        resolved = report.summary.resolved_count,
        attempted = report.summary.attempted,
        failures = report.summary.failures.len(),
        "{}",
        console_summary(&report).replace('\n', " ")
    );

    let run_id = match ledger {
        Some(ledger) => match ledger
            .record_run(ctx.mode.as_str(), &report, Some(&ctx.output_path))
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("could not record run in ledger: {:#}", e);
                None
            }
        },
        None => None,
    };

    Ok(RunResult {
        mode: ctx.mode,
        planned: planned.len(),
        report: Some(report),
        governor,
        prune,
        run_id,
    })
}

async fn run_browser(
    cfg: &ClipfetchConfig,
    ctx: &RunContext,
    planned: &[ClipRecord],
    stop: &StopToken,
) -> Result<(RunReport, GovernorReport)> {
    let browser = ChromiumBrowser::launch(&cfg.browser)
        .await
        .context("launch browser")?;
    let resolver = Arc::new(BrowserResolver::new(
        browser.sessions(),
        MediaMatcher::from_settings(&cfg.browser),
        ResolveTiming::from_settings(&cfg.browser),
    ));
    let result = resolve_planned(
        planned,
        planned,
        Vec::new(),
        resolver,
        cfg.concurrency,
        stop,
        ctx,
    )
    .await;
    if let Err(e) = browser.shutdown().await {
        tracing::warn!("browser shutdown: {:#}", e);
    }
    Ok(result)
}

async fn run_download(
    cfg: &ClipfetchConfig,
    ctx: &RunContext,
    planned: &[ClipRecord],
    stop: &StopToken,
) -> Result<(RunReport, GovernorReport, PruneReport)> {
    tokio::fs::create_dir_all(&ctx.download_dir)
        .await
        .with_context(|| format!("create download dir: {}", ctx.download_dir.display()))?;

    let plan = plan_downloads(&ctx.download_dir, planned);
    let preresolved = plan
        .present
        .iter()
        .map(|(clip, path)| {
            ResolutionOutcome::new(
                clip.id.clone(),
                OutcomeStatus::Resolved(path.display().to_string()),
            )
        })
        .collect();
    let resolver = Arc::new(ExternalDownloader::new(&cfg.downloader, &ctx.download_dir));
    let (report, governor) = resolve_planned(
        planned,
        &plan.to_fetch,
        preresolved,
        resolver,
        cfg.concurrency,
        stop,
        ctx,
    )
    .await;

    let planned_ids: HashSet<String> = planned.iter().map(|c| c.id.clone()).collect();
    let prune = match prune_unplanned(&ctx.download_dir, &planned_ids) {
        Ok(prune) => prune,
        Err(e) => {
            tracing::warn!("pruning download dir failed: {:#}", e);
            PruneReport::default()
        }
    };
    Ok((report, governor, prune))
}

#[cfg(test)]
mod tests;
