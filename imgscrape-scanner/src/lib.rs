pub mod document;
pub mod error;
pub mod fetcher;
pub mod source;

pub use document::HtmlDocument;
pub use error::{Result, ScrapeError};
pub use fetcher::HttpFetcher;
pub use source::{ByteSource, ByteStream, DocumentSource};
