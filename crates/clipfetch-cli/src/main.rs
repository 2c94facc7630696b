use clipfetch_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; fall back to stderr if the
    // state directory is not writable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = Cli::run_from_args().await {
        tracing::error!("fatal: {:#}", err);
        eprintln!("clipfetch error: {:#}", err);
        std::process::exit(1);
    }
}
