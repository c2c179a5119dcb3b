//! Raw page fetching.
//!
//! The crawler only needs "give me the HTML behind this URL". [`PageFetcher`]
//! is that seam; [`HttpFetcher`] is the real implementation and tests plug
//! in an in-memory map instead.

use crate::config::CrawlerConfig;
use crate::error::{CrawlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use std::time::Instant;
use tracing::{debug, instrument};

/// Source of raw HTML documents.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the response body as text.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// `reqwest`-backed fetcher sending a fixed user agent and referrer.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build one shared client from the crawler settings.
    pub fn from_config(config: &CrawlerConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(referrer) = HeaderValue::from_str(&config.referrer) {
            headers.insert(REFERER, referrer);
        }
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.fetch_timeout())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}
