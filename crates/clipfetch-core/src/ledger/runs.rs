//! Run insert and query operations.

use anyhow::Result;
use sqlx::Row;
use std::path::Path;

use super::db::{unix_timestamp, RunLedger};
use super::types::{OutcomeRow, RunEntry};
use crate::aggregate::RunReport;
use crate::resolve::OutcomeStatus;

fn status_detail(status: &OutcomeStatus) -> Option<&str> {
    match status {
        OutcomeStatus::Resolved(r) | OutcomeStatus::Failed(r) => Some(r.as_str()),
        OutcomeStatus::TimedOut => None,
    }
}

impl RunLedger {
    /// Stores a finished run and all its outcomes. Returns the run id.
    pub async fn record_run(
        &self,
        mode: &str,
        report: &RunReport,
        output_path: Option<&Path>,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let run_id = sqlx::query(
            r#"
            INSERT INTO runs (mode, started_at, ended_at, duration_ms, attempted, resolved, output_path, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(mode)
        .bind(report.started_at.timestamp())
        .bind(report.ended_at.timestamp())
        .bind(report.summary.duration.as_millis() as i64)
        .bind(report.summary.attempted as i64)
        .bind(report.summary.resolved_count as i64)
        .bind(output_path.map(|p| p.display().to_string()))
        .bind(unix_timestamp())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for (i, (clip_id, status)) in report.outcomes.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO outcomes (run_id, position, clip_id, status, detail)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(run_id)
            .bind(i as i64 + 1)
            .bind(clip_id)
            .bind(status.as_str())
            .bind(status_detail(status))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(run_id)
    }

    /// Most recent runs first.
    pub async fn list_runs(&self, limit: u32) -> Result<Vec<RunEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, mode, started_at, ended_at, duration_ms, attempted, resolved, output_path
            FROM runs
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(RunEntry {
                id: row.get("id"),
                mode: row.get("mode"),
                started_at: row.get("started_at"),
                ended_at: row.get("ended_at"),
                duration_ms: row.get("duration_ms"),
                attempted: row.get("attempted"),
                resolved: row.get("resolved"),
                output_path: row.get("output_path"),
            });
        }
        Ok(out)
    }

    /// Outcomes of one run in planned order.
    pub async fn run_outcomes(&self, run_id: i64) -> Result<Vec<OutcomeRow>> {
        let rows = sqlx::query(
            r#"
            SELECT position, clip_id, status, detail
            FROM outcomes
            WHERE run_id = ?
            ORDER BY position
            "#,
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OutcomeRow {
                position: row.get("position"),
                clip_id: row.get("clip_id"),
                status: row.get("status"),
                detail: row.get("detail"),
            })
            .collect())
    }
}
