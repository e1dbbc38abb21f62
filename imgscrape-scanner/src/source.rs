use crate::document::HtmlDocument;
use crate::error::Result;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::future::Future;

/// Body of a remote resource, delivered chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Fetches a page and hands back a queryable document.
pub trait DocumentSource: Send + Sync + 'static {
    fn fetch_document(&self, url: &str) -> impl Future<Output = Result<HtmlDocument>> + Send;
}

/// Opens the raw body of a remote resource.
pub trait ByteSource: Send + Sync + 'static {
    fn open_stream(&self, url: &str) -> impl Future<Output = Result<ByteStream>> + Send;
}
