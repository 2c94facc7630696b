//! `clipfetch --history`: list recent runs from the ledger.

use anyhow::Result;
use chrono::{Local, TimeZone};
use clipfetch_core::ledger::RunLedger;

fn format_time(unix: i64) -> String {
    Local
        .timestamp_opt(unix, 0)
        .single()
        .map(|t| t.format("%d.%m.%Y %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub async fn run_history(limit: u32) -> Result<()> {
    let ledger = RunLedger::open_default().await?;
    let runs = ledger.list_runs(limit).await?;
    if runs.is_empty() {
        println!("No runs recorded.");
        return Ok(());
    }
    println!(
        "{:<6} {:<9} {:<20} {:<10} {:<9} {}",
        "ID", "MODE", "STARTED", "FOUND", "SECONDS", "OUTPUT"
    );
    for r in runs {
        println!(
            "{:<6} {:<9} {:<20} {:<10} {:<9} {}",
            r.id,
            r.mode,
            format_time(r.started_at),
            format!("{}/{}", r.resolved, r.attempted),
            format!("{:.1}", r.duration_ms as f64 / 1000.0),
            r.output_path.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
