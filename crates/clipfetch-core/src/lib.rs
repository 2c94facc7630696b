//! clipfetch core: resolves Twitch clips to direct media URLs (or local
//! files) through a bounded pool of isolated browser sessions.

pub mod aggregate;
pub mod clip;
pub mod config;
pub mod control;
pub mod download;
pub mod governor;
pub mod ledger;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod reconcile;
pub mod resolve;
pub mod supplier;
