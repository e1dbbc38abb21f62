use crate::document::HtmlDocument;
use crate::error::{Result, ScrapeError};
use crate::source::{ByteSource, ByteStream, DocumentSource};
use futures::StreamExt;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("imgscrape/", env!("CARGO_PKG_VERSION"));

/// HTTP implementation of both page fetching and raw resource transfer.
///
/// Redirects follow reqwest's default policy. No request deadline is set
/// unless one is asked for with [`HttpFetcher::with_timeout`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60));

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout).connect_timeout(timeout);
        }

        Ok(Self::from_client(builder.build()?))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> Result<Response> {
        let parsed = Url::parse(url).map_err(|e| ScrapeError::InvalidUrl(format!("{}: {}", url, e)))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| ScrapeError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::fetch(url, format!("HTTP {}", status)));
        }

        Ok(response)
    }
}

impl DocumentSource for HttpFetcher {
    async fn fetch_document(&self, url: &str) -> Result<HtmlDocument> {
        debug!("Fetching document {}", url);
        let response = self.get(url).await?;
        let body = response.text().await.map_err(|e| ScrapeError::fetch(url, e))?;
        Ok(HtmlDocument::new(url, body))
    }
}

impl ByteSource for HttpFetcher {
    async fn open_stream(&self, url: &str) -> Result<ByteStream> {
        debug!("Opening byte stream {}", url);
        let response = self.get(url).await?;
        let owned_url = url.to_string();
        let stream = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| ScrapeError::transfer(owned_url.clone(), e)))
            .boxed();
        Ok(stream)
    }
}
