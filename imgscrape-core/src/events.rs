use imgscrape_scanner::ScrapeError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Per-unit diagnostic produced by the pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A crawl unit is about to fetch a page
    FetchingPage { url: String },
    /// An image link was found on a page
    Found { page: String, link: String },
    /// A page could not be fetched or queried
    CrawlFailed {
        url: String,
        kind: &'static str,
        error: String,
    },
    /// A resource was written to disk
    Saved { url: String, path: PathBuf },
    /// A resource could not be downloaded or written
    DownloadFailed {
        url: String,
        kind: &'static str,
        error: String,
    },
}

impl PipelineEvent {
    pub fn crawl_failed(url: impl Into<String>, error: &ScrapeError) -> Self {
        Self::CrawlFailed {
            url: url.into(),
            kind: error.kind(),
            error: error.to_string(),
        }
    }

    pub fn download_failed(url: impl Into<String>, error: &ScrapeError) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            kind: error.kind(),
            error: error.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PipelineEvent::CrawlFailed { .. } | PipelineEvent::DownloadFailed { .. }
        )
    }

    pub fn to_json(&self) -> String {
        // Every field is a plain string or path, serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::FetchingPage { url } => write!(f, "Fetching Page: {}", url),
            PipelineEvent::Found { link, .. } => write!(f, "Found: {}", link),
            PipelineEvent::CrawlFailed { url, error, .. } => {
                write!(f, "ERROR: Failed to crawl \"{}\": {}", url, error)
            }
            PipelineEvent::Saved { path, .. } => write!(f, "Saving {}", path.display()),
            PipelineEvent::DownloadFailed { error, .. } => write!(f, "ERROR: {}", error),
        }
    }
}

/// Callback receiving every [`PipelineEvent`] as it happens.
pub type EventCallback = Arc<dyn Fn(PipelineEvent) + Send + Sync>;

/// Counters gathered over one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub pages_attempted: usize,
    pub pages_failed: usize,
    pub links_found: usize,
    pub unique_links: usize,
    pub files_saved: usize,
    pub files_failed: usize,
}

#[derive(Debug, Default)]
struct Counters {
    pages_attempted: AtomicUsize,
    pages_failed: AtomicUsize,
    links_found: AtomicUsize,
    files_saved: AtomicUsize,
    files_failed: AtomicUsize,
}

/// Diagnostic sink shared by every unit of a run. Counts events, mirrors
/// them to `tracing`, and forwards them to the optional callback.
#[derive(Clone, Default)]
pub struct Reporter {
    callback: Option<EventCallback>,
    counters: Arc<Counters>,
}

impl Reporter {
    pub fn new(callback: Option<EventCallback>) -> Self {
        Self {
            callback,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn emit(&self, event: PipelineEvent) {
        let counter = match &event {
            PipelineEvent::FetchingPage { .. } => &self.counters.pages_attempted,
            PipelineEvent::Found { .. } => &self.counters.links_found,
            PipelineEvent::CrawlFailed { .. } => &self.counters.pages_failed,
            PipelineEvent::Saved { .. } => &self.counters.files_saved,
            PipelineEvent::DownloadFailed { .. } => &self.counters.files_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if event.is_failure() {
            warn!("{}", event);
        } else {
            debug!("{}", event);
        }

        if let Some(ref callback) = self.callback {
            callback(event);
        }
    }

    pub fn summary(&self, unique_links: usize) -> PipelineSummary {
        PipelineSummary {
            pages_attempted: self.counters.pages_attempted.load(Ordering::Relaxed),
            pages_failed: self.counters.pages_failed.load(Ordering::Relaxed),
            links_found: self.counters.links_found.load(Ordering::Relaxed),
            unique_links,
            files_saved: self.counters.files_saved.load(Ordering::Relaxed),
            files_failed: self.counters.files_failed.load(Ordering::Relaxed),
        }
    }
}
