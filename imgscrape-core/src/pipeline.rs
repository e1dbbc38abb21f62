use crate::crawl::CrawlStage;
use crate::dedup::spawn_dedup;
use crate::download::DownloadStage;
use crate::events::{EventCallback, PipelineSummary, Reporter};
use crate::limiter::ConcurrencyLimiter;
use crate::tracker::CompletionTracker;
use imgscrape_scanner::{ByteSource, DocumentSource};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tracing::{error, info};

pub const DEFAULT_CRAWL_WORKERS: usize = 5;
pub const DEFAULT_DOWNLOAD_WORKERS: usize = 5;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Options for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub seeds: Vec<String>,
    pub destination: PathBuf,
    pub crawl_workers: usize,
    pub download_workers: usize,
    pub channel_capacity: usize,
}

impl PipelineOptions {
    pub fn new(destination: impl Into<PathBuf>, seeds: Vec<String>) -> Self {
        Self {
            seeds,
            destination: destination.into(),
            crawl_workers: DEFAULT_CRAWL_WORKERS,
            download_workers: DEFAULT_DOWNLOAD_WORKERS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_crawl_workers(mut self, workers: usize) -> Self {
        self.crawl_workers = workers;
        self
    }

    pub fn with_download_workers(mut self, workers: usize) -> Self {
        self.download_workers = workers;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("crawl workers", self.crawl_workers),
            ("download workers", self.download_workers),
            ("channel capacity", self.channel_capacity),
        ] {
            if value == 0 {
                return Err(format!("{} must be at least 1", name));
            }
            if value > Semaphore::MAX_PERMITS {
                return Err(format!(
                    "{} must be at most {}",
                    name,
                    Semaphore::MAX_PERMITS
                ));
            }
        }
        if self.destination.as_os_str().is_empty() {
            return Err("destination folder must not be empty".to_string());
        }
        Ok(())
    }
}

/// Runs crawl, dedup and download to completion.
///
/// Shutdown order:
/// 1. crawl units are scheduled, then the dedup and dispatch tasks start;
/// 2. once every crawl unit has finished, the driver drops its link sender,
///    which is the only thing that lets dedup close the download channel;
/// 3. the dispatch task is joined, so every download unit is registered
///    before the download tracker is awaited.
///
/// Failures of individual pages or files are reported through `callback`
/// and never abort the run. The only error is invalid options.
pub async fn run_pipeline<D, B>(
    options: PipelineOptions,
    pages: Arc<D>,
    resources: Arc<B>,
    callback: Option<EventCallback>,
) -> Result<PipelineSummary, String>
where
    D: DocumentSource,
    B: ByteSource,
{
    options.validate()?;
    let PipelineOptions {
        seeds,
        destination,
        crawl_workers,
        download_workers,
        channel_capacity,
    } = options;

    info!(
        "Starting pipeline: {} seed(s), {} crawl / {} download workers, saving to {}",
        seeds.len(),
        crawl_workers,
        download_workers,
        destination.display()
    );

    let reporter = Reporter::new(callback);
    let crawl_tracker = CompletionTracker::new();
    let download_tracker = CompletionTracker::new();
    let (link_tx, link_rx) = mpsc::channel::<String>(channel_capacity);
    let (unique_tx, unique_rx) = mpsc::channel::<String>(channel_capacity);

    let crawl = CrawlStage::new(
        pages,
        ConcurrencyLimiter::new(crawl_workers),
        crawl_tracker.clone(),
        reporter.clone(),
    );
    crawl.crawl_all(seeds, &link_tx);

    let dedup = spawn_dedup(link_rx, unique_tx);

    let dispatch = DownloadStage::new(
        resources,
        destination,
        ConcurrencyLimiter::new(download_workers),
        download_tracker.clone(),
        reporter.clone(),
    )
    .download_all(unique_rx);

    crawl_tracker.wait().await;
    drop(link_tx);

    let unique_links = match dedup.await {
        Ok(count) => count,
        Err(e) => {
            error!("Dedup task failed: {}", e);
            0
        }
    };
    if let Err(e) = dispatch.await {
        error!("Download dispatch task failed: {}", e);
    }
    download_tracker.wait().await;

    let summary = reporter.summary(unique_links);
    info!(
        "Pipeline complete: {} saved, {} failed, {} unique link(s)",
        summary.files_saved, summary.files_failed, summary.unique_links
    );
    Ok(summary)
}
