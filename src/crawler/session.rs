//! Per-run crawl state and the final report
//!
//! The coordinator owns one `CrawlSession` per run. Image workers only share
//! the content hash set; every other field is written by the coordinator from
//! the outcomes the workers return.

use crate::crawler::fetcher::FetchError;
use crate::crawler::frontier::CrawlTarget;
use crate::download::{ContentHashSet, DownloadError, DownloadOutcome};
use crate::state::{PageState, SkipStats};
use crate::url::normalize;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// One page target that left the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub url: Url,
    pub depth: u32,

    /// Terminal state the target ended in
    pub state: PageState,
}

impl PageRecord {
    pub fn new(target: &CrawlTarget, state: PageState) -> Self {
        Self {
            url: target.url.clone(),
            depth: target.depth,
            state,
        }
    }
}

/// An image written to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedImage {
    pub url: Url,
    pub path: PathBuf,
}

/// Mutable state of one crawl run
#[derive(Debug)]
pub struct CrawlSession {
    started_at: DateTime<Utc>,

    /// Normalized URLs of pages fetched with a 2xx status
    visited: HashSet<String>,

    /// Image URLs already attempted in this run
    attempted_images: HashSet<String>,

    hashes: ContentHashSet,
    skips: SkipStats,
    accepted: Vec<AcceptedImage>,
    failed_images: Vec<Url>,
    page_log: Vec<PageRecord>,
}

impl CrawlSession {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            visited: HashSet::new(),
            attempted_images: HashSet::new(),
            hashes: Arc::new(Mutex::new(HashSet::new())),
            skips: SkipStats::new(),
            accepted: Vec::new(),
            failed_images: Vec::new(),
            page_log: Vec::new(),
        }
    }

    /// Handle to the content hash set for the duplicate filter
    pub fn content_hashes(&self) -> ContentHashSet {
        Arc::clone(&self.hashes)
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(normalize(url).as_str())
    }

    /// Records a successfully fetched page
    pub fn mark_visited(&mut self, url: &Url) {
        self.visited.insert(normalize(url).as_str().to_string());
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Claims an image URL for downloading
    ///
    /// Returns false if the URL was already attempted in this run.
    pub fn claim_image(&mut self, url: &Url) -> bool {
        self.attempted_images.insert(url.as_str().to_string())
    }

    pub fn record_page(&mut self, record: PageRecord) {
        self.page_log.push(record);
    }

    /// Tallies the outcome of one image attempt
    pub fn record_outcome(&mut self, url: Url, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Accepted(path) => self.accepted.push(AcceptedImage { url, path }),
            DownloadOutcome::Skipped(reason) => self.skips.record(reason),
            // Interrupted attempts are neither successes nor failures
            DownloadOutcome::Failed(DownloadError::Fetch(FetchError::Cancelled)) => {}
            DownloadOutcome::Failed(_) => self.failed_images.push(url),
        }
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn skipped_count(&self) -> u64 {
        self.skips.total()
    }

    /// Closes the session and produces the report
    pub fn into_report(self, start_url: Url, output_dir: PathBuf, cancelled: bool) -> CrawlReport {
        CrawlReport {
            start_url,
            output_dir,
            started_at: self.started_at,
            finished_at: Utc::now(),
            pages_visited: self.visited.len(),
            images_found: self.attempted_images.len(),
            accepted: self.accepted,
            failed_images: self.failed_images,
            skips: self.skips,
            page_log: self.page_log,
            cancelled,
        }
    }
}

impl Default for CrawlSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of a finished (or cancelled) crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub start_url: Url,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Pages fetched with a 2xx status
    pub pages_visited: usize,

    /// Distinct image URLs attempted
    pub images_found: usize,

    pub accepted: Vec<AcceptedImage>,
    pub failed_images: Vec<Url>,
    pub skips: SkipStats,

    /// Every page target that left the frontier, in processing order
    pub page_log: Vec<PageRecord>,

    /// True when the run ended on a cancellation signal
    pub cancelled: bool,
}

impl CrawlReport {
    pub fn images_accepted(&self) -> usize {
        self.accepted.len()
    }

    pub fn images_failed(&self) -> usize {
        self.failed_images.len()
    }

    pub fn images_skipped(&self) -> u64 {
        self.skips.total()
    }

    /// Page targets that ended in the given state
    pub fn pages_in_state(&self, state: PageState) -> usize {
        self.page_log.iter().filter(|r| r.state == state).count()
    }

    pub fn pages_disallowed(&self) -> usize {
        self.pages_in_state(PageState::Disallowed)
    }

    pub fn pages_failed(&self) -> usize {
        self.pages_in_state(PageState::FetchFailed)
    }

    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}
