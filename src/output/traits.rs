//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers, which turn
//! a finished crawl report into something a person can read.

use crate::crawler::CrawlReport;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output to {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for output handlers
///
/// Each handler renders the same report to a different destination.
pub trait OutputHandler {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Renders the report to this handler's destination
    fn write_report(&self, report: &CrawlReport) -> OutputResult<()>;
}

/// Runs every handler, logging failures instead of stopping at the first one
///
/// Returns the number of handlers that failed.
pub fn write_all(handlers: &[&dyn OutputHandler], report: &CrawlReport) -> usize {
    let mut failures = 0;
    for handler in handlers {
        if let Err(e) = handler.write_report(report) {
            tracing::error!("{} output failed: {}", handler.name(), e);
            failures += 1;
        }
    }
    failures
}
