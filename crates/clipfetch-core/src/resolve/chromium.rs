//! Headless Chromium sessions over the DevTools protocol (chromiumoxide).
//!
//! One browser process per run; every clip gets its own browser context
//! (incognito-like: separate cookies and cache) with a single page.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{BrowserContextId, CloseParams};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    EventResponseReceived, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::media::ObservedResponse;
use super::session::{PageSession, SessionFactory};
use crate::config::BrowserSettings;

/// Capacity of a session's response channel. The forwarder waits when it is
/// full, so nothing is dropped; the worker drains it on every poll.
const RESPONSE_BUFFER: usize = 256;

const VIDEO_SOURCE_JS: &str = r#"(() => {
    const v = document.querySelector('video');
    if (!v) return '';
    const s = v.querySelector('source');
    return v.currentSrc || v.src || (s ? s.src : '') || '';
})()"#;

const SCROLL_JS: &str = "window.scrollBy(0, window.innerHeight)";

/// The browser process and its CDP event loop.
pub struct ChromiumBrowser {
    browser: Arc<Browser>,
    handler_task: JoinHandle<()>,
    settings: BrowserSettings,
}

impl ChromiumBrowser {
    /// Launch Chromium with the configured binary, window size and head mode.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.viewport_width, settings.viewport_height)
            .no_sandbox();
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(exe) = &settings.executable {
            builder = builder.chrome_executable(exe);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("launch Chromium")?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("browser handler: {}", e);
                }
            }
        });
        tracing::info!(headless = settings.headless, "browser launched");

        Ok(Self {
            browser: Arc::new(browser),
            handler_task,
            settings: settings.clone(),
        })
    }

    /// Session factory sharing this browser.
    pub fn sessions(&self) -> ChromiumSessions {
        ChromiumSessions {
            browser: Arc::clone(&self.browser),
            user_agent: self.settings.user_agent.clone(),
            viewport: (self.settings.viewport_width, self.settings.viewport_height),
        }
    }

    /// Close the browser. Call after every session factory has been dropped.
    pub async fn shutdown(self) -> Result<()> {
        let ChromiumBrowser {
            browser,
            handler_task,
            ..
        } = self;
        match Arc::try_unwrap(browser) {
            Ok(mut browser) => {
                browser.close().await.context("close browser")?;
            }
            Err(shared) => {
                tracing::warn!("browser still referenced at shutdown, closing over CDP");
                shared
                    .execute(CloseParams::default())
                    .await
                    .context("close browser")?;
            }
        }
        if tokio::time::timeout(Duration::from_secs(5), handler_task)
            .await
            .is_err()
        {
            tracing::warn!("browser event loop did not stop within 5s");
        }
        tracing::info!("browser closed");
        Ok(())
    }
}

/// Opens one isolated context + page per call.
#[derive(Clone)]
pub struct ChromiumSessions {
    browser: Arc<Browser>,
    user_agent: String,
    viewport: (u32, u32),
}

impl ChromiumSessions {
    async fn setup_page(&self, context_id: &BrowserContextId) -> Result<Page> {
        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("target params: {}", e))?;
        let page = self.browser.new_page(target).await.context("open page")?;
        page.execute(SetUserAgentOverrideParams::new(self.user_agent.clone()))
            .await
            .context("set user agent")?;
        page.execute(SetDeviceMetricsOverrideParams::new(
            i64::from(self.viewport.0),
            i64::from(self.viewport.1),
            1.0,
            false,
        ))
        .await
        .context("set viewport")?;
        Ok(page)
    }

    async fn dispose_context(&self, context_id: BrowserContextId) {
        if let Err(e) = self
            .browser
            .execute(DisposeBrowserContextParams::new(context_id))
            .await
        {
            tracing::warn!("dispose browser context: {}", e);
        }
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessions {
    type Session = ChromiumSession;

    async fn open(&self) -> Result<ChromiumSession> {
        let context_id = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .context("create browser context")?
            .result
            .browser_context_id;

        let page = match self.setup_page(&context_id).await {
            Ok(p) => p,
            Err(e) => {
                self.dispose_context(context_id).await;
                return Err(e);
            }
        };
        let mut events = match page.event_listener::<EventResponseReceived>().await {
            Ok(ev) => ev,
            Err(e) => {
                let _ = page.close().await;
                self.dispose_context(context_id).await;
                return Err(e).context("subscribe to network responses");
            }
        };

        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);
        let forwarder = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let observed = ObservedResponse {
                    url: event.response.url.clone(),
                    content_type: event.response.mime_type.clone(),
                };
                if tx.send(observed).await.is_err() {
                    break;
                }
            }
        });

        Ok(ChromiumSession {
            browser: Arc::clone(&self.browser),
            context_id: Some(context_id),
            page: Some(page),
            responses: rx,
            forwarder,
        })
    }
}

/// One browser context with one page and its response subscription.
pub struct ChromiumSession {
    browser: Arc<Browser>,
    context_id: Option<BrowserContextId>,
    page: Option<Page>,
    responses: mpsc::Receiver<ObservedResponse>,
    forwarder: JoinHandle<()>,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("browser session already closed"))
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page()?
            .goto(url)
            .await
            .with_context(|| format!("navigate to {}", url))?;
        Ok(())
    }

    async fn nudge(&mut self) -> Result<()> {
        self.page()?.evaluate(SCROLL_JS).await.context("scroll")?;
        Ok(())
    }

    fn drain_responses(&mut self) -> Vec<ObservedResponse> {
        let mut out = Vec::new();
        while let Ok(r) = self.responses.try_recv() {
            out.push(r);
        }
        out
    }

    async fn video_source(&mut self) -> Result<Option<String>> {
        let src: String = self
            .page()?
            .evaluate(VIDEO_SOURCE_JS)
            .await
            .context("read <video> source")?
            .into_value()
            .context("decode <video> source")?;
        Ok(Some(src).filter(|s| !s.trim().is_empty()))
    }

    async fn close(&mut self) -> Result<()> {
        self.forwarder.abort();
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!("close page: {}", e);
            }
        }
        if let Some(context_id) = self.context_id.take() {
            self.browser
                .execute(DisposeBrowserContextParams::new(context_id))
                .await
                .context("dispose browser context")?;
        }
        Ok(())
    }

    fn close_detached(&mut self) {
        self.forwarder.abort();
        let page = self.page.take();
        let context_id = self.context_id.take();
        if page.is_none() && context_id.is_none() {
            return;
        }
        let browser = Arc::clone(&self.browser);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Some(page) = page {
                        let _ = page.close().await;
                    }
                    if let Some(id) = context_id {
                        let _ = browser.execute(DisposeBrowserContextParams::new(id)).await;
                    }
                });
            }
            Err(_) => tracing::warn!("no runtime to close browser session; context leaks until exit"),
        }
    }
}
