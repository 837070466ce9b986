//! Output module for crawl summaries
//!
//! This module handles:
//! - Printing the end-of-run summary table
//! - Writing an optional markdown report

mod markdown;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_summary, generate_markdown_summary, MarkdownOutput};
pub use stats::{format_summary_table, print_summary, summary_rows, ConsoleOutput};
pub use traits::{write_all, OutputError, OutputHandler, OutputResult};
