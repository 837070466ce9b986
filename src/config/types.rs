use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of leading bytes hashed for duplicate detection (64 KiB)
pub const DEFAULT_HASH_PREFIX_BYTES: usize = 64 * 1024;

/// Largest accepted `delay-seconds` (one hour)
pub const MAX_DELAY_SECONDS: f64 = 3600.0;

/// Main configuration structure for the image crawler
///
/// Every section has defaults, so an empty TOML document (or no file at all)
/// yields a usable configuration once a start URL is supplied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub filter: FilterConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Traversal and politeness configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Page the crawl starts from; its host bounds the crawl
    pub start_url: Option<String>,

    /// Maximum number of pages successfully fetched
    pub max_pages: u32,

    /// Maximum link depth from the start page (0 = start page only)
    pub max_depth: u32,

    /// Minimum interval between any two outbound requests (seconds)
    pub delay_seconds: f64,

    /// Timeout for page and image GET requests (seconds)
    pub request_timeout_secs: u64,

    /// Timeout for the content-type HEAD probe (seconds)
    pub head_timeout_secs: u64,

    /// Number of concurrent image downloads per page
    pub image_workers: usize,

    /// Raise the request interval to the robots.txt Crawl-delay when larger
    pub honor_crawl_delay: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: None,
            max_pages: 10,
            max_depth: 2,
            delay_seconds: 1.0,
            request_timeout_secs: 10,
            head_timeout_secs: 5,
            image_workers: 1,
            honor_crawl_delay: true,
        }
    }
}

impl CrawlerConfig {
    /// Minimum inter-request interval as a Duration
    ///
    /// Values above [`MAX_DELAY_SECONDS`] are clamped; negative values
    /// become zero. Validation rejects both before a crawl starts.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_seconds.min(MAX_DELAY_SECONDS)).unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn head_timeout(&self) -> Duration {
        Duration::from_secs(self.head_timeout_secs)
    }
}

/// Image acceptance filter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FilterConfig {
    /// Minimum file size in KB (1 KB = 1024 bytes)
    pub min_size_kb: u64,

    /// Minimum image width in pixels
    pub min_width: u32,

    /// Minimum image height in pixels
    pub min_height: u32,

    /// Skip images whose leading bytes were already seen this run
    pub no_duplicates: bool,

    /// File extensions never downloaded (case-insensitive, without the dot)
    pub excluded_extensions: Vec<String>,

    /// Number of leading bytes hashed for duplicate detection
    pub hash_prefix_bytes: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_size_kb: 10,
            min_width: 100,
            min_height: 100,
            no_duplicates: false,
            excluded_extensions: vec!["webp".to_string()],
            hash_prefix_bytes: DEFAULT_HASH_PREFIX_BYTES,
        }
    }
}

impl FilterConfig {
    /// Minimum accepted size in bytes
    pub fn min_size_bytes(&self) -> u64 {
        self.min_size_kb.saturating_mul(1024)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "image-crawler".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the declared user-agent string
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory that receives accepted images
    pub directory: PathBuf,

    /// Optional path of a markdown summary written after the crawl
    pub summary_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("downloaded_images"),
            summary_path: None,
        }
    }
}
