//! Resolution worker: turn a clip's playback page into a media reference.
//!
//! [`ClipResolver`] is the seam the governor drives. The browser-backed
//! implementation lives in `worker` and talks to sessions through the
//! [`PageSession`]/[`SessionFactory`] traits; `chromium` provides those on top
//! of a headless Chromium via the DevTools protocol. The download-mode
//! resolver (external downloader) lives in `crate::download`.

mod chromium;
mod media;
mod outcome;
mod poll;
mod session;
mod worker;

pub use chromium::{ChromiumBrowser, ChromiumSession, ChromiumSessions};
pub use media::{MediaMatcher, ObservedResponse};
pub use outcome::{OutcomeStatus, ResolutionOutcome, ResolveError};
pub use poll::{poll_until, PollSchedule, Poller};
pub use session::{PageSession, SessionFactory, SessionGuard};
pub use worker::{BrowserResolver, ResolveTiming};

use async_trait::async_trait;

use crate::clip::ClipRecord;

/// Resolves one clip. Implementations never retry and never panic on
/// per-clip failures; every error becomes part of the returned outcome.
#[async_trait]
pub trait ClipResolver: Send + Sync + 'static {
    async fn resolve(&self, clip: &ClipRecord) -> ResolutionOutcome;
}
