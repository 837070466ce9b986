//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the declared user agent string
//! - GET requests for page text and streamed image bytes
//! - HEAD requests to sniff an image's Content-Type
//! - Pacing, per-request timeouts and cancellation
//! - Error classification
//!
//! There is no retry logic: a failed request is reported once and the caller
//! moves on to the next target.

use crate::config::{Config, UserAgentConfig};
use crate::crawler::pacer::Pacer;
use reqwest::{redirect::Policy, Client, RequestBuilder, Response};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Maximum number of redirects followed per request
const MAX_REDIRECTS: usize = 10;

/// Errors that can occur during fetching
///
/// None of these abort a crawl; the coordinator records them per target.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,
}

impl FetchError {
    /// Short classification label used in logs and reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::HttpStatus(_) => "http-status",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
        }
    }

    pub(crate) fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Page body content
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use image_crawler::config::UserAgentConfig;
/// use image_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Paced, timeout-bound HTTP access shared by every crawl component
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    pacer: Arc<Pacer>,
    request_timeout: Duration,
    head_timeout: Duration,
}

impl Fetcher {
    /// Creates a fetcher from the crawl configuration
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent)?;
        Ok(Self::with_client(
            client,
            Arc::new(Pacer::new(config.crawler.delay())),
            config.crawler.request_timeout(),
            config.crawler.head_timeout(),
        ))
    }

    /// Creates a fetcher from its parts
    pub fn with_client(
        client: Client,
        pacer: Arc<Pacer>,
        request_timeout: Duration,
        head_timeout: Duration,
    ) -> Self {
        Self {
            client,
            pacer,
            request_timeout,
            head_timeout,
        }
    }

    /// The pacer gating every request made through this fetcher
    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// Fetches a page and returns its body as text
    ///
    /// Any non-2xx final status is reported as `FetchError::HttpStatus`.
    pub async fn fetch_page(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<FetchedPage, FetchError> {
        let request = self.client.get(url.clone()).timeout(self.request_timeout);
        let response = self.send(request, self.request_timeout, cancel).await?;

        let status_code = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = content_type_of(&response);

        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            body = response.text() => {
                body.map_err(|e| FetchError::from_reqwest(e, self.request_timeout))?
            }
        };

        Ok(FetchedPage {
            final_url,
            status_code,
            content_type,
            body,
        })
    }

    /// Starts a GET for raw bytes and returns the response for streaming
    ///
    /// The per-request timeout also bounds reading the body.
    pub async fn fetch_bytes(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<Response, FetchError> {
        let request = self.client.get(url.clone()).timeout(self.request_timeout);
        self.send(request, self.request_timeout, cancel).await
    }

    /// Sends a HEAD request and returns the Content-Type header, if any
    pub async fn head_content_type(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, FetchError> {
        let request = self.client.head(url.clone()).timeout(self.head_timeout);
        let response = self.send(request, self.head_timeout, cancel).await?;
        Ok(content_type_of(&response))
    }

    /// Fetches `/robots.txt` from the origin of `base_url` and returns its text
    pub async fn fetch_robots_txt(
        &self,
        base_url: &Url,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        let robots_url = robots_url_for(base_url)?;
        let page = self.fetch_page(&robots_url, cancel).await?;
        Ok(page.body)
    }

    /// Timeout applied to GET requests, body reads included
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Waits for the pacer, sends the request and checks the status
    async fn send(
        &self,
        request: RequestBuilder,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Response, FetchError> {
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = async {
                self.pacer.wait().await;
                request.send().await
            } => result.map_err(|e| FetchError::from_reqwest(e, timeout))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        Ok(response)
    }
}

/// Builds `<scheme>://<host[:port]>/robots.txt` for a URL's origin
pub fn robots_url_for(url: &Url) -> Result<Url, FetchError> {
    url.join("/robots.txt")
        .map_err(|e| FetchError::Network(format!("invalid robots.txt URL: {}", e)))
}

fn content_type_of(response: &Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
