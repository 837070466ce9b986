//! Markdown summary generation
//!
//! This module generates a human-readable markdown report of a crawl,
//! including totals, skip reasons, the page log and the saved images.

use crate::crawler::CrawlReport;
use crate::output::traits::{OutputError, OutputHandler, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Generates a markdown summary file from a crawl report
pub fn generate_markdown_summary(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(report);

    let mut file = File::create(output_path).map_err(|source| OutputError::Write {
        path: output_path.display().to_string(),
        source,
    })?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_summary(report: &CrawlReport) -> String {
    let mut md = String::new();

    md.push_str("# Image Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Start URL**: {}\n", report.start_url));
    md.push_str(&format!("- **Output Directory**: {}\n", report.output_dir.display()));
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        report.duration().as_secs_f64()
    ));
    md.push_str(&format!(
        "- **Status**: {}\n\n",
        if report.cancelled { "cancelled" } else { "completed" }
    ));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Pages visited | {} |\n", report.pages_visited));
    md.push_str(&format!("| Pages disallowed | {} |\n", report.pages_disallowed()));
    md.push_str(&format!("| Pages failed | {} |\n", report.pages_failed()));
    md.push_str(&format!("| Images found | {} |\n", report.images_found));
    md.push_str(&format!("| Images downloaded | {} |\n", report.images_accepted()));
    md.push_str(&format!("| Images skipped | {} |\n", report.images_skipped()));
    md.push_str(&format!("| Failed downloads | {} |\n\n", report.images_failed()));

    // Skip reasons
    let skips = report.skips.non_zero();
    if !skips.is_empty() {
        md.push_str("## Skipped Images\n\n");
        md.push_str("| Reason | Count |\n");
        md.push_str("|--------|-------|\n");
        for (reason, count) in skips {
            md.push_str(&format!("| {} (`{}`) | {} |\n", reason.describe(), reason, count));
        }
        md.push('\n');
    }

    // Page log
    if !report.page_log.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| Depth | URL | State |\n");
        md.push_str("|-------|-----|-------|\n");
        for record in &report.page_log {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                record.depth, record.url, record.state
            ));
        }
        md.push('\n');
    }

    // Saved images
    if !report.accepted.is_empty() {
        md.push_str("## Downloaded Images\n\n");
        for image in &report.accepted {
            let name = image
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            md.push_str(&format!("- `{}` from {}\n", name, image.url));
        }
        md.push('\n');
    }

    // Failed downloads
    if !report.failed_images.is_empty() {
        md.push_str("## Failed Downloads\n\n");
        for url in &report.failed_images {
            md.push_str(&format!("- {}\n", url));
        }
        md.push('\n');
    }

    md
}

/// Output handler writing the markdown summary to a file
#[derive(Debug, Clone)]
pub struct MarkdownOutput {
    path: PathBuf,
}

impl MarkdownOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputHandler for MarkdownOutput {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn write_report(&self, report: &CrawlReport) -> OutputResult<()> {
        generate_markdown_summary(report, &self.path)?;
        tracing::info!("Summary written to {}", self.path.display());
        Ok(())
    }
}
