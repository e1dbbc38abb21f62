use crate::events::{PipelineEvent, Reporter};
use crate::limiter::ConcurrencyLimiter;
use crate::link::normalize_seed;
use crate::tracker::{CompletionTracker, TrackedUnit};
use imgscrape_scanner::DocumentSource;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// First stage: fetch every seed page and push the `src` of each of its
/// `<img>` elements onto the link channel.
pub struct CrawlStage<S> {
    source: Arc<S>,
    limiter: ConcurrencyLimiter,
    tracker: CompletionTracker,
    reporter: Reporter,
}

impl<S> Clone for CrawlStage<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            limiter: self.limiter.clone(),
            tracker: self.tracker.clone(),
            reporter: self.reporter.clone(),
        }
    }
}

impl<S: DocumentSource> CrawlStage<S> {
    pub fn new(
        source: Arc<S>,
        limiter: ConcurrencyLimiter,
        tracker: CompletionTracker,
        reporter: Reporter,
    ) -> Self {
        Self {
            source,
            limiter,
            tracker,
            reporter,
        }
    }

    /// Schedules one crawl unit per seed and returns without waiting.
    ///
    /// Each unit is registered with the stage tracker before it is spawned,
    /// so waiting on the tracker after this call covers every seed. The
    /// caller keeps `link_sink` open until that wait completes.
    pub fn crawl_all<I>(&self, seeds: I, link_sink: &mpsc::Sender<String>)
    where
        I: IntoIterator<Item = String>,
    {
        for seed in seeds {
            let unit = self.tracker.track();
            let stage = self.clone();
            let sink = link_sink.clone();
            tokio::spawn(async move { stage.crawl_page(seed, sink, unit).await });
        }
    }

    async fn crawl_page(&self, seed: String, sink: mpsc::Sender<String>, _unit: TrackedUnit) {
        let _permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                warn!("Crawl limiter unavailable, skipping {}: {}", seed, e);
                return;
            }
        };

        let url = normalize_seed(&seed);
        self.reporter.emit(PipelineEvent::FetchingPage { url: url.clone() });

        let links = match self.source.fetch_document(&url).await {
            Ok(document) => document.attribute_values("img", "src"),
            Err(e) => Err(e),
        };

        let links = match links {
            Ok(links) => links,
            Err(e) => {
                self.reporter.emit(PipelineEvent::crawl_failed(&url, &e));
                return;
            }
        };

        for link in links.into_iter().filter(|link| !link.is_empty()) {
            self.reporter.emit(PipelineEvent::Found {
                page: url.clone(),
                link: link.clone(),
            });

            if sink.send(link).await.is_err() {
                warn!("Link channel closed, dropping remaining links from {}", url);
                break;
            }
        }

        debug!("Finished crawling {}", url);
    }
}
