//! Cursor-paginated clip listing.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Deserialize;

use super::auth::AppToken;
use super::error::SupplierError;
use super::http;
use crate::clip::{sanitize_clip_id, ClipRecord};
use crate::config::TwitchConfig;

/// Creation-time window for the listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipWindow {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl ClipWindow {
    /// Window covering the `days` days up to `now`.
    pub fn last_days(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            started_at: now - Duration::days(days.max(0)),
            ended_at: now,
        }
    }

    /// `(started_at, ended_at)` as ISO-8601 UTC with seconds precision and `Z`.
    pub fn query_bounds(&self) -> (String, String) {
        (
            self.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.ended_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }
}

#[derive(Debug, Deserialize)]
struct ClipsPage {
    data: Option<Vec<HelixClip>>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HelixClip {
    id: String,
    url: String,
    #[serde(default)]
    view_count: u64,
    created_at: DateTime<Utc>,
}

/// Upper bound on pages followed in one listing.
pub const MAX_PAGES: usize = 10_000;

/// Clips gathered by a listing, plus the reason it stopped early (if any).
#[derive(Debug, Default)]
pub struct Listing {
    pub clips: Vec<ClipRecord>,
    pub pages: usize,
    pub stopped_early: Option<SupplierError>,
}

/// Follows `pagination.cursor` until it is absent, keeping clips with at
/// least `min_views` views.
///
/// `fetch_page` receives the cursor for the next page (`None` for the first)
/// and returns the raw response body. A page without a `data` field, or a
/// fetch error, ends the listing with `stopped_early` set; clips from earlier
/// pages are kept.
pub fn paginate<F>(mut fetch_page: F, min_views: u64) -> Listing
where
    F: FnMut(Option<&str>) -> Result<Vec<u8>, SupplierError>,
{
    let mut listing = Listing::default();
    let mut cursor: Option<String> = None;

    loop {
        let body = match fetch_page(cursor.as_deref()) {
            Ok(b) => b,
            Err(e) => {
                listing.stopped_early = Some(e);
                break;
            }
        };
        let page: ClipsPage = match serde_json::from_slice(&body) {
            Ok(p) => p,
            Err(e) => {
                listing.stopped_early =
                    Some(SupplierError::Listing(format!("malformed page: {}", e)));
                break;
            }
        };
        let Some(data) = page.data else {
            listing.stopped_early = Some(SupplierError::Listing(format!(
                "page without data: {}",
                String::from_utf8_lossy(&body)
            )));
            break;
        };
        listing.pages += 1;
        listing.clips.extend(
            data.into_iter()
                .filter(|c| c.view_count >= min_views)
                .map(|c| ClipRecord {
                    id: sanitize_clip_id(&c.id),
                    playback_url: c.url,
                    view_count: c.view_count,
                    created_at: c.created_at,
                }),
        );

        let next = page
            .pagination
            .and_then(|p| p.cursor)
            .filter(|c| !c.is_empty());
        // Empty pages may still carry a cursor; only a repeated cursor ends early.
        match next {
            Some(c) if cursor.as_deref() == Some(c.as_str()) => break,
            Some(_) if listing.pages >= MAX_PAGES => {
                listing.stopped_early = Some(SupplierError::Listing(format!(
                    "page limit of {} reached",
                    MAX_PAGES
                )));
                break;
            }
            Some(c) => cursor = Some(c),
            None => break,
        }
    }

    if let Some(e) = &listing.stopped_early {
        tracing::warn!(pages = listing.pages, "listing stopped early: {}", e);
    }
    listing
}

/// Lists a broadcaster's clips in `window` via Helix `GET /clips`.
pub fn list_clips(
    cfg: &TwitchConfig,
    token: &AppToken,
    broadcaster_id: &str,
    window: &ClipWindow,
) -> Listing {
    let (started_at, ended_at) = window.query_bounds();
    let first = cfg.page_size.clamp(1, 100).to_string();
    let headers = token.headers();
    let endpoint = format!("{}/clips", cfg.api_base);

    paginate(
        |cursor| {
            let mut params = vec![
                ("broadcaster_id", broadcaster_id),
                ("started_at", started_at.as_str()),
                ("ended_at", ended_at.as_str()),
                ("first", first.as_str()),
            ];
            if let Some(c) = cursor {
                params.push(("after", c));
            }
            let url = url::Url::parse_with_params(&endpoint, &params)
                .map_err(|e| SupplierError::Listing(format!("clips URL: {}", e)))?;
            let resp = http::get(url.as_str(), &headers)
                .map_err(|e| SupplierError::Listing(format!("{:#}", e)))?;
            if !resp.is_success() {
                return Err(SupplierError::Listing(format!(
                    "clips endpoint returned HTTP {}: {}",
                    resp.status,
                    resp.body_text()
                )));
            }
            Ok(resp.body)
        },
        cfg.min_views,
    )
}
