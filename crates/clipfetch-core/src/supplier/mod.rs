//! Metadata supplier: Twitch Helix client.
//!
//! Token exchange → broadcaster lookup → cursor-paginated clip listing,
//! filtered by view count. Uses blocking curl handles, so the async entry
//! point runs the whole exchange on the blocking pool.

mod auth;
mod error;
mod http;
mod listing;

pub use auth::{exchange_token, lookup_broadcaster_id, AppToken};
pub use error::SupplierError;
pub use listing::{list_clips, paginate, ClipWindow, Listing};

use chrono::{DateTime, Utc};

use crate::config::TwitchConfig;

/// Runs the full supplier flow in the current thread.
///
/// Token or user lookup failure is returned as `SupplierError::Auth`; listing
/// problems are reported through `Listing::stopped_early`.
pub fn fetch_clips_blocking(
    cfg: &TwitchConfig,
    now: DateTime<Utc>,
) -> Result<Listing, SupplierError> {
    if cfg.channel.trim().is_empty() {
        return Err(SupplierError::Auth("twitch.channel must be set".to_string()));
    }
    let token = exchange_token(cfg)?;
    let broadcaster_id = lookup_broadcaster_id(cfg, &token, cfg.channel.trim())?;
    tracing::info!(channel = %cfg.channel, broadcaster_id = %broadcaster_id, "resolved channel");

    let window = ClipWindow::last_days(now, cfg.days_back);
    let listing = list_clips(cfg, &token, &broadcaster_id, &window);
    tracing::info!(
        clips = listing.clips.len(),
        pages = listing.pages,
        min_views = cfg.min_views,
        "listed clips from {} to {}",
        window.started_at.date_naive(),
        window.ended_at.date_naive()
    );
    Ok(listing)
}

/// Async wrapper around [`fetch_clips_blocking`].
pub async fn fetch_clips(cfg: &TwitchConfig, now: DateTime<Utc>) -> Result<Listing, SupplierError> {
    let cfg = cfg.clone();
    tokio::task::spawn_blocking(move || fetch_clips_blocking(&cfg, now))
        .await
        .map_err(|e| SupplierError::Listing(format!("supplier task join: {}", e)))?
}
