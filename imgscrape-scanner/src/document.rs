use crate::error::{Result, ScrapeError};
use scraper::{Html, Selector};

/// A fetched HTML page that can be queried for element attributes.
///
/// The raw markup is kept and parsed per query, so the document stays `Send`
/// and can be held across await points by the crawl tasks.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    url: String,
    body: String,
}

impl HtmlDocument {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the value of `attr` for every element matching `selector`, in
    /// document order. Elements without the attribute are skipped; empty
    /// values are kept so the caller decides what to do with them.
    pub fn attribute_values(&self, selector: &str, attr: &str) -> Result<Vec<String>> {
        let parsed = Selector::parse(selector)
            .map_err(|e| ScrapeError::ParseError(format!("invalid selector '{}': {}", selector, e)))?;

        let document = Html::parse_document(&self.body);
        let values = document
            .select(&parsed)
            .filter_map(|element| element.value().attr(attr))
            .map(|value| value.to_string())
            .collect();

        Ok(values)
    }
}
