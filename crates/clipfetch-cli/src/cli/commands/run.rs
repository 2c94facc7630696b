//! `clipfetch [MODE]`: execute one run.

use anyhow::Result;
use clipfetch_core::config::ClipfetchConfig;
use clipfetch_core::control::StopToken;
use clipfetch_core::ledger::RunLedger;
use clipfetch_core::pipeline::{self, RunContext, RunMode};
use std::path::PathBuf;

/// What a Ctrl-C press does.
#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// First press: stop dispatching, let running clips finish.
    Drain,
    /// Any later press: quit immediately.
    Exit,
}

fn on_interrupt(stop: &StopToken) -> Interrupt {
    if stop.is_stopped() {
        Interrupt::Exit
    } else {
        stop.request_stop();
        Interrupt::Drain
    }
}

pub async fn run_clips(cfg: &ClipfetchConfig, mode: RunMode, input: Option<PathBuf>) -> Result<()> {
    let ctx = RunContext::new(mode, cfg, input);

    let stop = StopToken::new();
    let signal_stop = stop.clone();
    let signal_task = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match on_interrupt(&signal_stop) {
                Interrupt::Drain => {
                    tracing::warn!("interrupt received, finishing clips in flight");
                    eprintln!("\nStopping: no new clips will be started. Press Ctrl-C again to quit now.");
                }
                Interrupt::Exit => {
                    tracing::warn!("second interrupt, exiting without waiting for clips in flight");
                    eprintln!("\nAborted.");
                    std::process::exit(130);
                }
            }
        }
    });

    let ledger = match RunLedger::open_default().await {
        Ok(ledger) => Some(ledger),
        Err(e) => {
            tracing::warn!("run ledger unavailable: {:#}", e);
            None
        }
    };

    println!("clipfetch {} run started", mode.as_str());
    let result = pipeline::run(cfg, &ctx, &stop, ledger.as_ref()).await;
    signal_task.abort();
    let result = result?;

    println!("\n{}", result.console_summary(&ctx));
    if let Some(report) = &result.report {
        if !report.summary.failures.is_empty() {
            println!(
                "{} clip(s) failed, see {}",
                report.summary.failures.len(),
                ctx.run_log_path.display()
            );
        }
        println!("Output: {}", ctx.output_path.display());
    }
    if result.governor.cancelled > 0 {
        println!("{} clip(s) cancelled before start.", result.governor.cancelled);
    }
    if let Some(prune) = &result.prune {
        if !prune.deleted.is_empty() {
            println!("Deleted {} stale file(s).", prune.deleted.len());
        }
        for err in &prune.failed {
            eprintln!("warning: {}", err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_interrupt_drains_second_exits() {
        let stop = StopToken::new();
        assert_eq!(on_interrupt(&stop), Interrupt::Drain);
        assert!(stop.is_stopped());
        assert_eq!(on_interrupt(&stop), Interrupt::Exit);
        assert_eq!(on_interrupt(&stop), Interrupt::Exit);
    }
}
