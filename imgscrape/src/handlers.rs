use anyhow::{Context, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use imgscrape_core::{EventCallback, PipelineEvent, PipelineOptions, PipelineSummary, run_pipeline};
use imgscrape_scanner::HttpFetcher;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::Level;

pub const USAGE: &str = "Usage: imgscrape [OPTIONS] <destination-folder> <seed-url> [seed-url ...]";

/// Exit status for a malformed invocation.
pub const USAGE_EXIT_CODE: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Everything the command line decided for one run
#[derive(Debug, Clone)]
pub struct Invocation {
    pub options: PipelineOptions,
    pub timeout: Option<Duration>,
    pub format: OutputFormat,
    pub quiet: bool,
    pub summary: bool,
    pub verbosity: u8,
}

/// Expands a leading `~` in the destination folder.
pub fn expand_destination(folder: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(folder).as_ref())
}

/// Turns parsed arguments into an [`Invocation`].
///
/// Fails when the destination folder or every seed URL is missing, or the
/// destination is blank. The caller reports that as a usage error.
pub fn parse_invocation(matches: &ArgMatches) -> Result<Invocation, String> {
    let folder = matches
        .get_one::<String>("FOLDER")
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .ok_or_else(|| "a destination folder is required".to_string())?;

    let seeds: Vec<String> = matches
        .get_many::<String>("URLS")
        .map(|urls| urls.cloned().collect())
        .unwrap_or_default();
    if seeds.is_empty() {
        return Err("at least one seed URL is required".to_string());
    }

    let count = |name: &str, default: usize| {
        matches
            .get_one::<u64>(name)
            .map(|v| usize::try_from(*v).unwrap_or(usize::MAX))
            .unwrap_or(default)
    };

    let options = PipelineOptions::new(expand_destination(folder), seeds)
        .with_crawl_workers(count("crawl-workers", 5))
        .with_download_workers(count("download-workers", 5))
        .with_channel_capacity(count("channel-capacity", 1));
    options.validate()?;

    let format = match matches.get_one::<String>("format").map(String::as_str) {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Text,
    };

    Ok(Invocation {
        options,
        timeout: matches.get_one::<u64>("timeout").map(|s| Duration::from_secs(*s)),
        format,
        quiet: matches.get_flag("quiet"),
        summary: matches.get_flag("summary"),
        verbosity: matches.get_count("verbose"),
    })
}

pub fn print_usage(reason: &str) {
    println!("{} {}", "ERROR:".red().bold(), reason);
    println!("{}", USAGE);
}

/// Sets up the stderr log subscriber. Warnings only by default, each `-v`
/// goes one level further.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Renders one diagnostic line.
pub fn render_event(event: &PipelineEvent, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => event.to_json(),
        OutputFormat::Text if event.is_failure() => event.to_string().red().to_string(),
        OutputFormat::Text => event.to_string(),
    }
}

// Event lines always go to stdout; the spinner lives on stderr.
fn print_line(progress: &ProgressBar, line: String) {
    progress.suspend(|| println!("{}", line));
}

fn event_printer(progress: ProgressBar, format: OutputFormat, quiet: bool) -> EventCallback {
    let pages = AtomicUsize::new(0);
    let saved = AtomicUsize::new(0);

    Arc::new(move |event: PipelineEvent| {
        match event {
            PipelineEvent::FetchingPage { .. } => {
                pages.fetch_add(1, Ordering::Relaxed);
            }
            PipelineEvent::Saved { .. } => {
                saved.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        progress.set_message(format!(
            "{} page(s) fetched, {} image(s) saved",
            pages.load(Ordering::Relaxed),
            saved.load(Ordering::Relaxed)
        ));

        if !quiet {
            print_line(&progress, render_event(&event, format));
        }
    })
}

/// Runs the pipeline for an invocation using the HTTP fetcher.
pub async fn run_scrape(invocation: Invocation) -> anyhow::Result<PipelineSummary> {
    let Invocation {
        options,
        timeout,
        format,
        quiet,
        ..
    } = invocation;

    let fetcher = Arc::new(HttpFetcher::with_timeout(timeout).context("Failed to build HTTP client")?);

    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress.set_message("Starting crawl...");

    let callback = event_printer(progress.clone(), format, quiet);
    let result = run_pipeline(options, Arc::clone(&fetcher), Arc::clone(&fetcher), Some(callback)).await;
    progress.finish_and_clear();

    result.map_err(|e| anyhow!(e))
}

pub fn format_summary(summary: &PipelineSummary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
        OutputFormat::Text => format!(
            "Pages: {} fetched, {} failed\nLinks: {} found, {} unique\nFiles: {} saved, {} failed",
            summary.pages_attempted,
            summary.pages_failed,
            summary.links_found,
            summary.unique_links,
            summary.files_saved,
            summary.files_failed
        ),
    }
}
