//! Run ledger (SQLite via sqlx).
//!
//! Records every finished run and its per-clip outcomes so past runs can be
//! inspected with `clipfetch --history`.

mod db;
mod runs;
mod types;

pub use db::RunLedger;
pub use types::{OutcomeRow, RunEntry};
