//! image-crawler main entry point
//!
//! This is the command-line interface for the image crawler.

use anyhow::Context;
use clap::Parser;
use image_crawler::config::{resolve_config, Config, ConfigOverrides};
use image_crawler::crawler::run_crawl;
use image_crawler::output::{write_all, ConsoleOutput, MarkdownOutput, OutputHandler};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// image-crawler: a polite, bounded web image harvester
///
/// Crawls a single site breadth-first while respecting robots.txt and a
/// minimum delay between requests, and saves the images it finds that pass
/// the format, size, dimension and duplicate filters.
#[derive(Parser, Debug)]
#[command(name = "image-crawler")]
#[command(version)]
#[command(about = "Crawl a website and download the images it contains", long_about = None)]
struct Cli {
    /// Starting URL to crawl (http or https)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output directory for images [default: downloaded_images]
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Minimum delay between requests in seconds [default: 1.0]
    #[arg(short, long, value_name = "SECS")]
    delay: Option<f64>,

    /// Maximum number of pages to visit [default: 10]
    #[arg(short = 'p', long, value_name = "N")]
    max_pages: Option<u32>,

    /// Maximum link depth, 0 visits only the start page [default: 2]
    #[arg(short = 'm', long, value_name = "N")]
    max_depth: Option<u32>,

    /// Minimum image size in KB [default: 10]
    #[arg(long, value_name = "KB")]
    min_size: Option<u64>,

    /// Minimum image width in pixels [default: 100]
    #[arg(long, value_name = "PX")]
    min_width: Option<u32>,

    /// Minimum image height in pixels [default: 100]
    #[arg(long, value_name = "PX")]
    min_height: Option<u32>,

    /// Skip images whose leading bytes match an image already saved
    #[arg(long)]
    no_duplicates: bool,

    /// Concurrent image downloads per page [default: 1]
    #[arg(short = 'w', long, value_name = "N")]
    workers: Option<usize>,

    /// Write a markdown summary to this file
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            start_url: self.url.clone(),
            output_dir: self.output.clone(),
            delay_seconds: self.delay,
            max_pages: self.max_pages,
            max_depth: self.max_depth,
            min_size_kb: self.min_size,
            min_width: self.min_width,
            min_height: self.min_height,
            no_duplicates: self.no_duplicates,
            image_workers: self.workers,
            summary_path: self.summary.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Some(path) = &cli.config {
        tracing::info!("Loading configuration from: {}", path.display());
    }
    let config = resolve_config(cli.config.as_deref(), cli.overrides())
        .context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("image_crawler=info,warn"),
            1 => EnvFilter::new("image_crawler=debug,info"),
            2 => EnvFilter::new("image_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== image-crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Start URL: {}",
        config.crawler.start_url.as_deref().unwrap_or("-")
    );
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Delay: {}s", config.crawler.delay_seconds);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  HEAD timeout: {}s", config.crawler.head_timeout_secs);
    println!("  Image workers: {}", config.crawler.image_workers);
    println!("  Honor Crawl-delay: {}", config.crawler.honor_crawl_delay);

    println!("\nFilters:");
    println!("  Min size: {}KB", config.filter.min_size_kb);
    println!(
        "  Min dimensions: {}x{}px",
        config.filter.min_width, config.filter.min_height
    );
    println!(
        "  Excluded formats: {}",
        config.filter.excluded_extensions.join(", ")
    );
    println!(
        "  Duplicates: {}",
        if config.filter.no_duplicates { "skipped" } else { "allowed" }
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    match &config.output.summary_path {
        Some(path) => println!("  Summary: {}", path.display()),
        None => println!("  Summary: -"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, quiet: bool) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current request");
            interrupt.cancel();
        }
    });

    let summary_path = config.output.summary_path.clone();
    let report = match run_crawl(config, cancel).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let console = ConsoleOutput;
    let markdown = summary_path.map(MarkdownOutput::new);

    let mut handlers: Vec<&dyn OutputHandler> = Vec::new();
    if !quiet {
        handlers.push(&console);
    }
    if let Some(markdown) = &markdown {
        handlers.push(markdown);
    }

    if write_all(&handlers, &report) > 0 {
        anyhow::bail!("failed to write crawl summary");
    }

    Ok(())
}
