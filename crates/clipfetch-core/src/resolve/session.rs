//! Browser session seam.
//!
//! A session is one isolated browsing context (own cookies and cache) with a
//! single page and a bounded subscription to that page's network responses.
//! The subscription lives and dies with the session.

use anyhow::Result;
use async_trait::async_trait;
use std::ops::{Deref, DerefMut};

use super::media::ObservedResponse;

#[async_trait]
pub trait PageSession: Send {
    /// Navigate the page and wait for it to load. The caller applies the timeout.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Scroll by one viewport; some players only start once in view.
    async fn nudge(&mut self) -> Result<()>;

    /// Take every response observed since the last call, in arrival order.
    fn drain_responses(&mut self) -> Vec<ObservedResponse>;

    /// Current source of the page's primary `<video>` element, if any.
    async fn video_source(&mut self) -> Result<Option<String>>;

    /// Close the page and its browsing context. Must be safe to call twice.
    async fn close(&mut self) -> Result<()>;

    /// Close without awaiting, for drop paths (cancelled or panicking workers).
    fn close_detached(&mut self);
}

/// Opens isolated sessions. Shared by all workers of a run.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    type Session: PageSession + 'static;

    async fn open(&self) -> Result<Self::Session>;
}

/// Owns a session and guarantees it is closed on every exit path.
///
/// Call [`SessionGuard::close`] on the normal path; if the guard is dropped
/// without it (worker future dropped, panic), the session is closed in the
/// background.
pub struct SessionGuard<S: PageSession> {
    session: S,
    closed: bool,
}

impl<S: PageSession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.closed = true;
        self.session.close().await
    }
}

impl<S: PageSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: PageSession> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: PageSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::debug!("session dropped without close, closing in background");
            self.session.close_detached();
        }
    }
}
