//! Configuration module for the image crawler
//!
//! This module handles loading TOML configuration files, layering command-line
//! overrides on top, and validating the result before any network activity.
//!
//! # Example
//!
//! ```no_run
//! use image_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod overrides;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, UserAgentConfig,
    DEFAULT_HASH_PREFIX_BYTES, MAX_DELAY_SECONDS,
};

// Re-export loading functions
pub use overrides::{resolve_config, ConfigOverrides};
pub use parser::{load_config, parse_config, read_config};
pub use validation::validate;
