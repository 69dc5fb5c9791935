//! Browser-backed transport
//!
//! Each session is one browser page. JSON endpoints render inside the
//! viewer's `<pre>` element; plain pages fall back to rendered body text.

use crate::browser;
use crate::config::Config;
use crate::infrastructure::transport::{
    FetchResponse, Transport, TransportError, TransportSession,
};
use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, Page};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Browser-backed transport; sole owner of the Browser handle
pub struct BrowserTransport {
    browser: Browser,
    /// Wait after navigation before reading the JSON viewer
    settle_ms: u64,
    /// Wait after navigation before reading rendered app pages
    render_wait_ms: u64,
}

impl BrowserTransport {
    /// Launch a headless browser per the configured proxy
    pub async fn launch(config: &Config) -> Result<Self> {
        let browser = browser::launch_headless(config.proxy_http.as_deref()).await?;
        Ok(Self {
            browser,
            settle_ms: 500,
            render_wait_ms: config.render_wait_ms,
        })
    }

    /// Fetch a client-rendered page and return its body text.
    ///
    /// Waits for the app to settle, then scrolls to the bottom and back so
    /// lazily-rendered sections are materialized before the text is read.
    pub async fn fetch_rendered(&self, url: &str) -> Result<String, TransportError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| TransportError::Session(e.to_string()))?;

        let result = self.render_and_read(&page, url).await;

        if let Err(e) = page.close().await {
            warn!("⚠️ failed to close page: {}", e);
        }
        result
    }

    async fn render_and_read(&self, page: &Page, url: &str) -> Result<String, TransportError> {
        info!("📍 navigating to {}", url);
        page.goto(url)
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        sleep(Duration::from_millis(self.render_wait_ms)).await;

        let _ = page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await;
        sleep(Duration::from_millis(2_000)).await;
        let _ = page.evaluate("window.scrollTo(0, 0)").await;
        sleep(Duration::from_millis(1_000)).await;

        let text = body_text(page)
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        debug!("retrieved {} characters", text.len());
        Ok(text)
    }

    /// Close the browser. Safe to call on every exit path.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("⚠️ failed to close browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("⚠️ failed to reap browser process: {}", e);
        }
    }
}

#[async_trait]
impl Transport for BrowserTransport {
    async fn open_session(&self) -> Result<Box<dyn TransportSession>, TransportError> {
        // Pages are cheap to create and clone (Arc inside); each session
        // gets its own so in-flight fetches never share one.
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| TransportError::Session(e.to_string()))?;
        Ok(Box::new(BrowserSession {
            page,
            settle_ms: self.settle_ms,
        }))
    }
}

struct BrowserSession {
    page: Page,
    settle_ms: u64,
}

impl BrowserSession {
    async fn fetch_inner(&self, url: &str) -> Result<FetchResponse, TransportError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let navigation = self
            .page
            .wait_for_navigation_response()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        // goto already fails hard on network errors, so a missing response
        // record means a served page
        let status = navigation
            .and_then(|r| r.response.as_ref().map(|resp| resp.status as u16))
            .unwrap_or(200);

        sleep(Duration::from_millis(self.settle_ms)).await;

        let body = page_text(&self.page)
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(FetchResponse { status, body })
    }
}

#[async_trait]
impl TransportSession for BrowserSession {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse, TransportError> {
        match tokio::time::timeout(timeout, self.fetch_inner(url)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                url: url.to_string(),
                ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn close(&self) {
        if let Err(e) = self.page.clone().close().await {
            warn!("⚠️ failed to close page: {}", e);
        }
    }
}

/// JSON endpoints are displayed inside a `<pre>` element; anything else
/// reads as rendered body text.
async fn page_text(page: &Page) -> Result<String, CdpError> {
    if let Ok(pre) = page.find_element("pre").await {
        if let Some(text) = pre.inner_text().await? {
            return Ok(text);
        }
    }
    body_text(page).await
}

async fn body_text(page: &Page) -> Result<String, CdpError> {
    let body = page.find_element("body").await?;
    Ok(body.inner_text().await?.unwrap_or_default())
}
