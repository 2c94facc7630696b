//! Resolution worker: one browser session per clip.
//!
//! Network observation is the primary strategy. The `<video>` source in the
//! DOM is only read after the network poll window is exhausted, and one more
//! network drain happens before the DOM value is accepted, so a qualifying
//! network response always wins over the DOM.

use async_trait::async_trait;
use std::time::Duration;

use super::media::MediaMatcher;
use super::outcome::{OutcomeStatus, ResolutionOutcome, ResolveError};
use super::poll::{PollSchedule, Poller};
use super::session::{PageSession, SessionFactory, SessionGuard};
use super::ClipResolver;
use crate::clip::ClipRecord;
use crate::config::BrowserSettings;

/// Time bounds for one worker.
#[derive(Debug, Clone, Copy)]
pub struct ResolveTiming {
    pub navigation_timeout: Duration,
    pub settle: Duration,
    pub poll: PollSchedule,
    pub dom_timeout: Duration,
}

impl ResolveTiming {
    pub fn from_settings(settings: &BrowserSettings) -> Self {
        Self {
            navigation_timeout: settings.navigation_timeout(),
            settle: settings.settle(),
            poll: PollSchedule::new(settings.poll_attempts, settings.poll_interval()),
            dom_timeout: settings.dom_timeout(),
        }
    }

    /// Longest time a worker can spend before giving up (excluding session open/close).
    pub fn max_duration(&self) -> Duration {
        self.navigation_timeout + self.settle + self.poll.max_wait() + self.dom_timeout
    }
}

/// [`ClipResolver`] that drives a browser session per clip.
pub struct BrowserResolver<F: SessionFactory> {
    factory: F,
    matcher: MediaMatcher,
    timing: ResolveTiming,
}

impl<F: SessionFactory> BrowserResolver<F> {
    pub fn new(factory: F, matcher: MediaMatcher, timing: ResolveTiming) -> Self {
        Self {
            factory,
            matcher,
            timing,
        }
    }

    fn observed_media(&self, session: &mut F::Session) -> Option<String> {
        let responses = session.drain_responses();
        self.matcher.first_match(&responses)
    }

    async fn discover(&self, session: &mut F::Session, url: &str) -> Result<String, ResolveError> {
        let nav = tokio::time::timeout(self.timing.navigation_timeout, session.navigate(url)).await;
        let nav_error = match nav {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("{:#}", e)),
            Err(_) => Some(format!(
                "navigation timed out after {}s",
                self.timing.navigation_timeout.as_secs()
            )),
        };
        if let Some(reason) = nav_error {
            // A stream that started before the load failed still counts.
            return self
                .observed_media(session)
                .ok_or(ResolveError::Navigation(reason));
        }

        if let Err(e) = session.nudge().await {
            tracing::debug!("scroll nudge failed: {:#}", e);
        }
        if let Some(found) = self.observed_media(session) {
            return Ok(found);
        }
        tokio::time::sleep(self.timing.settle).await;

        let mut poller = Poller::new(self.timing.poll);
        while poller.tick().await {
            if let Some(found) = self.observed_media(session) {
                tracing::debug!(checks = poller.attempts(), "media observed on network");
                return Ok(found);
            }
        }

        let dom_source =
            match tokio::time::timeout(self.timing.dom_timeout, session.video_source()).await {
                Ok(Ok(Some(src))) => self.matcher.accept_dom_source(&src),
                Ok(Ok(None)) => None,
                Ok(Err(e)) => {
                    tracing::debug!("video source lookup failed: {:#}", e);
                    None
                }
                Err(_) => None,
            };
        if let Some(found) = self.observed_media(session) {
            return Ok(found);
        }
        match dom_source {
            Some(src) => {
                tracing::debug!("media taken from <video> source");
                Ok(src)
            }
            None => Err(ResolveError::Timeout),
        }
    }
}

#[async_trait]
impl<F: SessionFactory> ClipResolver for BrowserResolver<F> {
    async fn resolve(&self, clip: &ClipRecord) -> ResolutionOutcome {
        let session = match self.factory.open().await {
            Ok(s) => s,
            Err(e) => {
                let status = ResolveError::Session(format!("{:#}", e)).into();
                return ResolutionOutcome::new(clip.id.clone(), status);
            }
        };
        let mut session = SessionGuard::new(session);
        let result = self.discover(&mut session, &clip.playback_url).await;
        if let Err(e) = session.close().await {
            tracing::warn!(clip = %clip.id, "closing browser session failed: {:#}", e);
        }

        let status: OutcomeStatus = match result {
            Ok(url) => OutcomeStatus::Resolved(url),
            Err(e) => e.into(),
        };
        tracing::debug!(clip = %clip.id, status = status.as_str(), "clip resolved");
        ResolutionOutcome::new(clip.id.clone(), status)
    }
}
