use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Cannot write {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transfer of {url} failed: {reason}")]
    Transfer { url: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ScrapeError {
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn transfer(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transfer {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Short category name used in machine-readable diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Fetch { .. }
            | ScrapeError::InvalidUrl(_)
            | ScrapeError::ParseError(_)
            | ScrapeError::HttpClient(_) => "fetch",
            ScrapeError::FileSystem { .. } => "filesystem",
            ScrapeError::Transfer { .. } => "transfer",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
