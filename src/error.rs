//! Error types shared across the crawler.
//!
//! Almost every failure inside the crawl loop is recovered locally (a failed
//! fetch becomes "not an article", a bad store line is skipped), so these
//! variants mostly travel as far as the nearest log statement. Only
//! [`CrawlError::Config`] is allowed to stop the process.

use thiserror::Error;

/// Everything that can go wrong while crawling.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Transport-level HTTP failure (DNS, TLS, timeout, body read).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    /// Durable store or article file I/O.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing or parsing JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Loading or validating the configuration file.
    #[error("configuration error: {0}")]
    Config(String),

    /// A URL that could not be parsed as an absolute URL.
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CrawlError>;

impl From<serde_yaml::Error> for CrawlError {
    fn from(e: serde_yaml::Error) -> Self {
        CrawlError::Config(e.to_string())
    }
}
