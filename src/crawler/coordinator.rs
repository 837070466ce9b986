//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Preparing the output directory and the HTTP fetcher
//! - Loading robots.txt once and applying its crawl delay
//! - Managing the breadth-first frontier
//! - Fetching pages, extracting links and images
//! - Fanning image downloads out over a bounded number of workers
//! - Producing the final report

use crate::config::Config;
use crate::crawler::extractor::parse_page;
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::frontier::{CrawlTarget, Frontier};
use crate::crawler::session::{CrawlReport, CrawlSession, PageRecord};
use crate::download::{DownloadOutcome, Downloader, ImageCandidate};
use crate::robots::RobotsGate;
use crate::state::PageState;
use crate::url::{parse_base_url, BaseHost, ExtensionPolicy};
use crate::{ConfigError, CrawlerError};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    start_url: Url,
    base: BaseHost,
    fetcher: Fetcher,
    downloader: Downloader,
    policy: ExtensionPolicy,
    frontier: Frontier,
    session: CrawlSession,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Parses the start URL, creates the output directory if missing and
    /// builds the HTTP client. No request is sent yet.
    pub fn new(config: Config) -> Result<Self, CrawlerError> {
        Self::with_cancellation(config, CancellationToken::new())
    }

    /// Creates a coordinator that stops when `cancel` fires
    pub fn with_cancellation(
        config: Config,
        cancel: CancellationToken,
    ) -> Result<Self, CrawlerError> {
        let raw_url = config
            .crawler
            .start_url
            .as_deref()
            .ok_or_else(|| ConfigError::InvalidUrl("no start URL configured".to_string()))?;
        let start_url = parse_base_url(raw_url)?;
        let base = BaseHost::from_url(&start_url)?;

        let output_dir = config.output.directory.clone();
        std::fs::create_dir_all(&output_dir).map_err(|source| CrawlerError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let fetcher = Fetcher::new(&config)?;
        let session = CrawlSession::new();
        let downloader = Downloader::from_config(&config, fetcher.clone(), session.content_hashes());
        let policy = ExtensionPolicy::from_config(&config.filter);

        let mut frontier = Frontier::new(config.crawler.max_depth);
        frontier.push_if_new(CrawlTarget::new(start_url.clone(), 0));

        Ok(Self {
            config,
            start_url,
            base,
            fetcher,
            downloader,
            policy,
            frontier,
            session,
            cancel,
        })
    }

    /// Token that stops this crawl when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the main crawl loop
    ///
    /// The loop ends when the frontier is empty, the page limit is reached,
    /// or the cancellation token fires. Per-page and per-image failures are
    /// recorded in the report and never end the crawl.
    pub async fn run(mut self) -> Result<CrawlReport, CrawlerError> {
        tracing::info!("Starting crawl of {}", self.start_url);
        tracing::info!("Output directory: {}", self.config.output.directory.display());

        let robots = RobotsGate::load(&self.fetcher, &self.start_url, &self.cancel).await;
        if self.config.crawler.honor_crawl_delay {
            if let Some(delay) = robots.crawl_delay() {
                if self.fetcher.pacer().raise_interval(delay).await {
                    tracing::info!("Using robots.txt crawl delay of {:.2}s", delay.as_secs_f64());
                }
            }
        }

        let max_pages = self.config.crawler.max_pages as usize;
        let start_time = std::time::Instant::now();

        loop {
            if self.cancel.is_cancelled() {
                tracing::warn!("Crawl cancelled, {} pages left in frontier", self.frontier.len());
                break;
            }

            if self.session.visited_count() >= max_pages {
                tracing::info!("Reached page limit of {}", max_pages);
                break;
            }

            let Some(target) = self.frontier.pop() else {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            };

            if self.session.is_visited(&target.url) {
                continue;
            }

            self.process_target(target, &robots).await?;
        }

        tracing::info!(
            "Crawl finished: {} pages visited, {} images saved in {:?}",
            self.session.visited_count(),
            self.session.accepted_count(),
            start_time.elapsed()
        );

        let cancelled = self.cancel.is_cancelled();
        Ok(self.session.into_report(
            self.start_url,
            self.config.output.directory,
            cancelled,
        ))
    }

    /// Processes a single page target
    ///
    /// This method:
    /// 1. Checks robots.txt
    /// 2. Fetches the page, rechecking robots.txt after a redirect
    /// 3. Extracts links and images
    /// 4. Downloads the images
    /// 5. Queues newly discovered links
    async fn process_target(
        &mut self,
        target: CrawlTarget,
        robots: &RobotsGate,
    ) -> Result<(), CrawlerError> {
        let state = PageState::Queued;

        if !robots.is_allowed(&target.url) {
            let state = state.transition(PageState::Disallowed)?;
            tracing::info!("{} disallowed by robots.txt", target.url);
            self.session.record_page(PageRecord::new(&target, state));
            return Ok(());
        }

        let state = state.transition(PageState::Fetching)?;
        tracing::info!("[{}] {}", target.depth, target.url);

        let page = match self.fetcher.fetch_page(&target.url, &self.cancel).await {
            Ok(page) => page,
            Err(e) => {
                let state = state.transition(PageState::FetchFailed)?;
                match e {
                    FetchError::Cancelled => tracing::debug!("Fetch of {} cancelled", target.url),
                    e => tracing::warn!("Failed to fetch {}: {}", target.url, e),
                }
                self.session.record_page(PageRecord::new(&target, state));
                return Ok(());
            }
        };

        if page.final_url != target.url && !robots.is_allowed(&page.final_url) {
            let state = state.transition(PageState::Disallowed)?;
            tracing::info!(
                "{} redirected to {}, which robots.txt disallows",
                target.url,
                page.final_url
            );
            self.session.record_page(PageRecord::new(&target, state));
            return Ok(());
        }

        self.session.mark_visited(&target.url);

        let parsed = if is_html(page.content_type.as_deref()) {
            parse_page(&page.body, &page.final_url, &self.base, &self.policy)
        } else {
            tracing::debug!(
                "Not extracting from {} (content type {:?})",
                target.url,
                page.content_type
            );
            Default::default()
        };

        let candidates: Vec<ImageCandidate> = parsed
            .images
            .into_iter()
            .filter(|url| self.session.claim_image(url))
            .map(|source_url| ImageCandidate {
                source_url,
                page_url: target.url.clone(),
            })
            .collect();
        let found = candidates.len();

        self.download_images(candidates).await;

        for link in parsed.links {
            if !self.session.is_visited(&link) {
                self.frontier
                    .push_if_new(CrawlTarget::new(link, target.depth + 1));
            }
        }

        let state = state.transition(PageState::Extracted)?;
        tracing::info!(
            "   Found: {} | Downloaded: {} | Skipped: {}",
            found,
            self.session.accepted_count(),
            self.session.skipped_count()
        );
        self.session.record_page(PageRecord::new(&target, state));

        Ok(())
    }

    /// Downloads a page's images with at most `image-workers` in flight
    async fn download_images(&mut self, candidates: Vec<ImageCandidate>) {
        let workers = self.config.crawler.image_workers.max(1);
        let downloader = &self.downloader;
        let cancel = &self.cancel;

        let outcomes: Vec<(Url, DownloadOutcome)> = stream::iter(candidates)
            .map(|candidate| async move {
                let outcome = downloader.download(&candidate, cancel).await;
                (candidate.source_url, outcome)
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        for (url, outcome) in outcomes {
            self.session.record_outcome(url, outcome);
        }
    }
}

/// Treats a missing content type as HTML
fn is_html(content_type: Option<&str>) -> bool {
    match content_type {
        Some(ct) => {
            let ct = ct.to_ascii_lowercase();
            ct.contains("text/html") || ct.contains("application/xhtml")
        }
        None => true,
    }
}

/// Runs a complete crawl operation
///
/// # Example
///
/// ```no_run
/// use image_crawler::config::{resolve_config, ConfigOverrides};
/// use image_crawler::crawler::run_crawl;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let overrides = ConfigOverrides {
///     start_url: Some("https://example.com".to_string()),
///     ..Default::default()
/// };
/// let config = resolve_config(None, overrides)?;
/// let report = run_crawl(config, CancellationToken::new()).await?;
/// println!("{} images saved", report.images_accepted());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    cancel: CancellationToken,
) -> Result<CrawlReport, CrawlerError> {
    Coordinator::with_cancellation(config, cancel)?.run().await
}
