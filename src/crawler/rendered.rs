//! Browser-driven page source for sites that render content with JavaScript

use crate::config::{BrowserConfig, FetcherConfig};
use crate::crawler::fetcher::{HttpFetcher, PageSource, Politeness};
use crate::crawler::wait::{poll_until, WaitOutcome};
use crate::{FetchError, FetchFailure};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use url::Url;

/// Errors from starting or stopping the browser
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Invalid browser settings: {0}")]
    Settings(String),

    #[error("DevTools protocol error: {0}")]
    Cdp(#[from] CdpError),
}

/// Fetches pages through a headless Chrome driven over the DevTools protocol
///
/// After navigation the DOM is polled for the ready marker; if it never
/// shows up the current DOM is used anyway. Binary downloads bypass the
/// browser and go through plain HTTP.
pub struct RenderedSource {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,

    /// Whether the browser process belongs to this source
    launched: bool,
    http: HttpFetcher,
    politeness: Politeness,
    ready_marker: String,
    poll_interval: Duration,
    wait_timeout: Duration,
}

impl RenderedSource {
    /// Launches (or attaches to) Chrome and opens the tab all pages load in
    pub async fn connect(fetcher: &FetcherConfig, browser: &BrowserConfig) -> crate::Result<Self> {
        let (chrome, mut events) = match &browser.debug_url {
            Some(debug_url) => {
                tracing::info!("Attaching to running browser at {}", debug_url);
                Browser::connect(debug_url.as_str())
                    .await
                    .map_err(BrowserError::from)?
            }
            None => Browser::launch(launch_config(fetcher, browser)?)
                .await
                .map_err(BrowserError::from)?,
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser event error: {}", e);
                }
            }
        });

        let page = chrome
            .new_page("about:blank")
            .await
            .map_err(BrowserError::from)?;
        page.set_user_agent(user_agent_override(fetcher)?)
            .await
            .map_err(BrowserError::from)?;

        Ok(Self {
            browser: chrome,
            handler,
            page,
            launched: browser.debug_url.is_none(),
            http: HttpFetcher::new(fetcher)?,
            politeness: Politeness::from_config(fetcher),
            ready_marker: browser.ready_marker.clone(),
            poll_interval: Duration::from_millis(browser.poll_interval_ms),
            wait_timeout: Duration::from_millis(browser.wait_timeout_ms),
        })
    }

    /// Closes the tab, and the browser too if this source launched it
    pub async fn shutdown(self) -> Result<(), BrowserError> {
        let Self {
            mut browser,
            handler,
            page,
            launched,
            ..
        } = self;

        page.close().await?;
        if launched {
            browser.close().await?;
            if let Err(e) = browser.wait().await {
                tracing::debug!("Browser process did not exit cleanly: {}", e);
            }
        }
        handler.abort();
        Ok(())
    }

    async fn wait_for_marker(&self, url: &Url) -> WaitOutcome {
        let page = &self.page;
        let marker = self.ready_marker.as_str();

        let outcome = poll_until(self.poll_interval, self.wait_timeout, || async move {
            match page.find_elements(marker).await {
                Ok(found) => !found.is_empty(),
                Err(e) => {
                    tracing::debug!("Ready-marker lookup failed: {}", e);
                    false
                }
            }
        })
        .await;

        if outcome == WaitOutcome::DeadlineElapsed {
            tracing::warn!(
                "Ready marker '{}' not present after {}ms on {}, using current DOM",
                marker,
                self.wait_timeout.as_millis(),
                url
            );
        }
        outcome
    }
}

#[async_trait]
impl PageSource for RenderedSource {
    fn name(&self) -> &'static str {
        "rendered"
    }

    async fn fetch_text(&self, url: &Url, _referer: Option<&str>) -> Result<String, FetchError> {
        self.politeness.wait().await;

        tracing::debug!("Navigating to {}", url);
        self.page
            .goto(url.as_str())
            .await
            .map_err(|e| browser_failure(url, e))?;

        self.wait_for_marker(url).await;

        self.page
            .content()
            .await
            .map_err(|e| browser_failure(url, e))
    }

    async fn fetch_bytes(&self, url: &Url, referer: Option<&str>) -> Result<Vec<u8>, FetchError> {
        self.http.fetch_bytes(url, referer).await
    }
}

/// Chrome launch settings derived from the fetcher and browser sections
fn launch_config(
    fetcher: &FetcherConfig,
    browser: &BrowserConfig,
) -> Result<ChromeConfig, BrowserError> {
    let mut builder = ChromeConfig::builder()
        .request_timeout(Duration::from_millis(fetcher.timeout_ms))
        .arg(format!("--user-agent={}", fetcher.user_agent));

    if let Some(language) = &fetcher.accept_language {
        builder = builder.arg(format!("--lang={}", language));
    }
    if let Some(executable) = &browser.chrome_executable {
        builder = builder.chrome_executable(executable);
    }
    if !browser.headless {
        builder = builder.with_head();
    }

    builder.build().map_err(BrowserError::Settings)
}

fn user_agent_override(fetcher: &FetcherConfig) -> Result<SetUserAgentOverrideParams, BrowserError> {
    let mut builder = SetUserAgentOverrideParams::builder().user_agent(fetcher.user_agent.as_str());
    if let Some(language) = &fetcher.accept_language {
        builder = builder.accept_language(language.as_str());
    }
    builder.build().map_err(BrowserError::Settings)
}

fn browser_failure(url: &Url, e: CdpError) -> FetchError {
    let cause = match e {
        CdpError::Timeout => FetchFailure::Timeout,
        CdpError::Ws(e) => FetchFailure::Connect(e.to_string()),
        other => FetchFailure::Request(other.to_string()),
    };
    FetchError::new(url.as_str(), cause)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher_config() -> FetcherConfig {
        FetcherConfig {
            user_agent: "TestAgent/1.0".to_string(),
            accept_language: Some("ur-PK,ur;q=0.9".to_string()),
            referer: None,
            timeout_ms: 5000,
            min_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    fn browser_config() -> BrowserConfig {
        BrowserConfig {
            ready_marker: "article".to_string(),
            wait_timeout_ms: 300,
            poll_interval_ms: 20,
            ..BrowserConfig::default()
        }
    }

    #[test]
    fn test_launch_config_with_explicit_executable() {
        let browser = BrowserConfig {
            chrome_executable: Some("/usr/bin/chromium".to_string()),
            ..browser_config()
        };
        assert!(launch_config(&fetcher_config(), &browser).is_ok());
    }

    #[test]
    fn test_user_agent_override_carries_language() {
        let params = user_agent_override(&fetcher_config()).unwrap();
        assert_eq!(params.user_agent, "TestAgent/1.0");
        assert_eq!(params.accept_language.as_deref(), Some("ur-PK,ur;q=0.9"));
    }

    #[test]
    fn test_timeout_maps_to_fetch_timeout() {
        let url = Url::parse("https://example.com/q/1").unwrap();
        let err = browser_failure(&url, CdpError::Timeout);

        assert_eq!(err.url, "https://example.com/q/1");
        assert!(matches!(err.cause, FetchFailure::Timeout));
    }

    #[tokio::test]
    #[ignore = "requires a local Chrome or Chromium"]
    async fn test_fetch_text_when_marker_present() {
        let source = RenderedSource::connect(&fetcher_config(), &browser_config())
            .await
            .unwrap();
        let url = Url::parse("data:text/html,<article><p>Rendered</p></article>").unwrap();

        let html = source.fetch_text(&url, None).await.unwrap();
        assert_eq!(source.wait_for_marker(&url).await, WaitOutcome::Ready);
        assert!(html.contains("Rendered"));

        source.shutdown().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a local Chrome or Chromium"]
    async fn test_deadline_still_returns_dom() {
        let source = RenderedSource::connect(&fetcher_config(), &browser_config())
            .await
            .unwrap();
        let url = Url::parse("data:text/html,<div><p>Static only</p></div>").unwrap();

        let html = source.fetch_text(&url, None).await.unwrap();
        assert_eq!(
            source.wait_for_marker(&url).await,
            WaitOutcome::DeadlineElapsed
        );
        assert!(html.contains("Static only"));

        source.shutdown().await.unwrap();
    }
}
