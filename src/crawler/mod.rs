//! Crawler module for page traversal and image collection
//!
//! This module contains the core crawling logic, including:
//! - Paced HTTP fetching with per-request timeouts
//! - HTML parsing for links and image candidates
//! - The breadth-first frontier
//! - Overall crawl coordination and the run report

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod pacer;
mod session;

pub use coordinator::{run_crawl, Coordinator};
pub use extractor::{extract_images, extract_links, parse_page, ParsedPage};
pub use fetcher::{build_http_client, robots_url_for, FetchError, FetchedPage, Fetcher};
pub use frontier::{CrawlTarget, Frontier};
pub use pacer::Pacer;
pub use session::{AcceptedImage, CrawlReport, CrawlSession, PageRecord};
