//! HTTP fetcher implementation
//!
//! This module handles all plain HTTP requests for the harvester, including:
//! - Building HTTP clients with browser-like default headers
//! - The randomized politeness delay before every request
//! - Error classification into [`FetchFailure`]
//!
//! There is no retry: every call makes at most one request.

use crate::config::FetcherConfig;
use crate::{ConfigError, FetchError, FetchFailure};
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Something that can retrieve pages for the coordinator
///
/// Implemented by [`HttpFetcher`] for ordinary sites and by
/// [`RenderedSource`](crate::crawler::RenderedSource) for sites that only
/// produce their content after JavaScript runs.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Retrieves an HTML page as text
    async fn fetch_text(&self, url: &Url, referer: Option<&str>) -> Result<String, FetchError>;

    /// Retrieves a binary resource such as a PDF attachment
    async fn fetch_bytes(&self, url: &Url, referer: Option<&str>) -> Result<Vec<u8>, FetchError>;
}

/// Uniformly random pause taken before each request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Politeness {
    min_ms: u64,
    max_ms: u64,
}

impl Politeness {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: max_ms.max(min_ms),
        }
    }

    pub fn from_config(config: &FetcherConfig) -> Self {
        Self::new(config.min_delay_ms, config.max_delay_ms)
    }

    /// Draws the next delay
    pub fn delay(&self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    pub async fn wait(&self) {
        let delay = self.delay();
        if !delay.is_zero() {
            tracing::trace!("Politeness delay: {}ms", delay.as_millis());
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builds an HTTP client with browser-like defaults
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(HarvestError)` - Invalid header value or client construction failure
///
/// # Example
///
/// ```no_run
/// use folio_harvest::config::FetcherConfig;
/// use folio_harvest::crawler::build_http_client;
///
/// let config = FetcherConfig {
///     user_agent: "Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0".to_string(),
///     accept_language: Some("en-US,en;q=0.9".to_string()),
///     referer: None,
///     timeout_ms: 30000,
///     min_delay_ms: 1000,
///     max_delay_ms: 3000,
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> crate::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

    if let Some(language) = &config.accept_language {
        let value = HeaderValue::from_str(language).map_err(|e| {
            ConfigError::Validation(format!("Invalid accept-language '{}': {}", language, e))
        })?;
        headers.insert(ACCEPT_LANGUAGE, value);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_millis(config.timeout_ms))
        .connect_timeout(Duration::from_millis(config.timeout_ms.min(10_000)))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Plain HTTP page source
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    politeness: Politeness,
    referer: Option<String>,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> crate::Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            politeness: Politeness::from_config(config),
            referer: config.referer.clone(),
        })
    }

    pub fn politeness(&self) -> Politeness {
        self.politeness
    }

    /// Sends one GET and checks the status
    ///
    /// An explicit `referer` wins over the configured site referer.
    async fn get(&self, url: &Url, referer: Option<&str>) -> Result<Response, FetchError> {
        self.politeness.wait().await;

        tracing::debug!("GET {}", url);
        let mut request = self.client.get(url.clone());
        if let Some(referer) = referer.or(self.referer.as_deref()) {
            request = request.header(REFERER, referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::new(url.as_str(), classify_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                url.as_str(),
                FetchFailure::Status(status.as_u16()),
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_text(&self, url: &Url, referer: Option<&str>) -> Result<String, FetchError> {
        let response = self.get(url, referer).await?;
        response
            .text()
            .await
            .map_err(|e| FetchError::new(url.as_str(), FetchFailure::Body(e.to_string())))
    }

    async fn fetch_bytes(&self, url: &Url, referer: Option<&str>) -> Result<Vec<u8>, FetchError> {
        let response = self.get(url, referer).await?;
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| FetchError::new(url.as_str(), FetchFailure::Body(e.to_string())))
    }
}

/// Maps a transport error to its failure cause
fn classify_error(e: &reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else if e.is_connect() {
        FetchFailure::Connect(e.to_string())
    } else if e.is_body() || e.is_decode() {
        FetchFailure::Body(e.to_string())
    } else {
        FetchFailure::Request(e.to_string())
    }
}
