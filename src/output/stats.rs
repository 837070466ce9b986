//! Console summary of a crawl report

use crate::crawler::CrawlReport;
use crate::output::traits::{OutputHandler, OutputResult};

/// Width of the summary banner
const BANNER_WIDTH: usize = 70;

/// Builds the label/value rows of the summary table
///
/// An empty label marks a blank separator line.
pub fn summary_rows(report: &CrawlReport) -> Vec<(String, String)> {
    let mut rows = vec![
        ("Pages visited".to_string(), report.pages_visited.to_string()),
        ("Images downloaded".to_string(), report.images_accepted().to_string()),
        ("Failed downloads".to_string(), report.images_failed().to_string()),
    ];

    if report.pages_disallowed() > 0 {
        rows.push((
            "Pages disallowed by robots.txt".to_string(),
            report.pages_disallowed().to_string(),
        ));
    }
    if report.pages_failed() > 0 {
        rows.push(("Pages failed".to_string(), report.pages_failed().to_string()));
    }

    let skips = report.skips.non_zero();
    if !skips.is_empty() {
        rows.push((String::new(), String::new()));
        rows.push(("Skipped (reasons):".to_string(), String::new()));
        for (reason, count) in skips {
            rows.push((format!("  - {}", reason.describe()), count.to_string()));
        }
    }

    rows
}

/// Formats the end-of-run summary table
pub fn format_summary_table(report: &CrawlReport) -> String {
    let rows = summary_rows(report);
    let label_width = rows
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "=".repeat(BANNER_WIDTH)));
    let title = if report.cancelled {
        "CRAWL SUMMARY (cancelled)"
    } else {
        "CRAWL SUMMARY"
    };
    out.push_str(&format!("{:^width$}\n", title, width = BANNER_WIDTH));
    out.push_str(&format!("{}\n", "=".repeat(BANNER_WIDTH)));

    for (label, value) in &rows {
        if label.is_empty() {
            out.push('\n');
        } else {
            out.push_str(&format!(
                "  {:<width$}  {:>10}\n",
                label,
                value,
                width = label_width
            ));
        }
    }

    out.push_str(&format!("{}\n", "=".repeat(BANNER_WIDTH)));
    out.push_str(&format!("Output: {}\n", report.output_dir.display()));
    out
}

/// Prints the summary table to stdout
pub fn print_summary(report: &CrawlReport) {
    print!("{}", format_summary_table(report));
}

/// Output handler writing the summary table to stdout
#[derive(Debug, Default)]
pub struct ConsoleOutput;

impl OutputHandler for ConsoleOutput {
    fn name(&self) -> &'static str {
        "console"
    }

    fn write_report(&self, report: &CrawlReport) -> OutputResult<()> {
        print_summary(report);
        Ok(())
    }
}
