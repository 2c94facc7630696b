//! CLI command handlers, one file per command.

mod history;
mod run;

pub use history::run_history;
pub use run::run_clips;
