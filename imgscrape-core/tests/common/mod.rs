// In-memory collaborators for driving the pipeline without a network.

#![allow(dead_code)]

use bytes::Bytes;
use futures::{StreamExt, stream};
use imgscrape_core::{EventCallback, PipelineEvent};
use imgscrape_scanner::{ByteSource, ByteStream, DocumentSource, HtmlDocument, Result, ScrapeError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Tracks how many calls are running at once and the highest value seen.
#[derive(Debug, Default)]
pub struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl Gauge {
    pub fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    pub fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Pages and resources served from maps keyed by fully normalized URL.
#[derive(Debug, Default)]
pub struct FakeWeb {
    pages: HashMap<String, String>,
    resources: HashMap<String, Vec<u8>>,
    delay: Duration,
    pub page_gauge: Gauge,
    pub resource_gauge: Gauge,
}

impl FakeWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn resource(mut self, url: &str, body: &[u8]) -> Self {
        self.resources.insert(url.to_string(), body.to_vec());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl DocumentSource for FakeWeb {
    async fn fetch_document(&self, url: &str) -> Result<HtmlDocument> {
        self.page_gauge.enter();
        tokio::time::sleep(self.delay).await;
        let page = self
            .pages
            .get(url)
            .map(|body| HtmlDocument::new(url, body.clone()))
            .ok_or_else(|| ScrapeError::fetch(url, "HTTP 404 Not Found"));
        self.page_gauge.leave();
        page
    }
}

impl ByteSource for FakeWeb {
    async fn open_stream(&self, url: &str) -> Result<ByteStream> {
        self.resource_gauge.enter();
        tokio::time::sleep(self.delay).await;
        let body = self
            .resources
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::fetch(url, "HTTP 404 Not Found"));
        self.resource_gauge.leave();

        let chunks: Vec<Result<Bytes>> = vec![Ok(Bytes::from(body?))];
        Ok(stream::iter(chunks).boxed())
    }
}

/// Collects every event a run reports.
pub fn recorder() -> (EventCallback, Arc<Mutex<Vec<PipelineEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let callback: EventCallback = Arc::new(move |event| sink.lock().unwrap().push(event));
    (callback, events)
}

pub fn count_where(events: &[PipelineEvent], pred: impl Fn(&PipelineEvent) -> bool) -> usize {
    events.iter().filter(|event| pred(event)).count()
}

pub fn image_page(links: &[&str]) -> String {
    let mut html = String::from("<html><body>");
    for link in links {
        html.push_str(&format!(r#"<img src="{}">"#, link));
    }
    html.push_str("</body></html>");
    html
}
