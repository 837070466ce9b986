//! Robots.txt handling module
//!
//! The crawl policy of the target host is fetched once when the crawl starts
//! and consulted before every page fetch. Image requests are not gated.

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::Fetcher;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// User agent token the crawl policy is evaluated for
pub const ROBOTS_AGENT: &str = "*";

/// The loaded crawl policy for the crawl's base host
#[derive(Debug, Clone)]
pub struct RobotsGate {
    robots: ParsedRobots,
}

impl RobotsGate {
    /// Fetches and parses robots.txt for the base URL's origin
    ///
    /// Any failure (HTTP error status, network error, timeout, cancellation)
    /// produces an allow-all gate and a warning. Loading never fails.
    pub async fn load(fetcher: &Fetcher, base_url: &Url, cancel: &CancellationToken) -> Self {
        match fetcher.fetch_robots_txt(base_url, cancel).await {
            Ok(content) => {
                tracing::debug!("Loaded robots.txt for {} ({} bytes)", base_url, content.len());
                Self::from_content(&content)
            }
            Err(e) => {
                tracing::warn!(
                    "Could not load robots.txt for {} ({}), allowing all pages",
                    base_url,
                    e
                );
                Self::allow_all()
            }
        }
    }

    /// Creates a gate from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            robots: ParsedRobots::from_content(content),
        }
    }

    /// Creates a gate that allows every page
    pub fn allow_all() -> Self {
        Self {
            robots: ParsedRobots::allow_all(),
        }
    }

    /// Checks whether a page URL may be fetched
    ///
    /// Queued targets are normalized without a trailing slash, so a path is
    /// also checked in its directory form: `/private` is refused by
    /// `Disallow: /private/`.
    pub fn is_allowed(&self, url: &Url) -> bool {
        if !self.robots.is_allowed(url, ROBOTS_AGENT) {
            return false;
        }

        match directory_form(url) {
            Some(dir) => self.robots.is_allowed(&dir, ROBOTS_AGENT),
            None => true,
        }
    }

    /// The `Crawl-delay` declared for all agents, if any
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.robots.crawl_delay(ROBOTS_AGENT)
    }
}

fn directory_form(url: &Url) -> Option<Url> {
    let path = url.path();
    if path.ends_with('/') {
        return None;
    }
    let mut dir = url.clone();
    dir.set_path(&format!("{}/", path));
    Some(dir)
}
