//! Crawler configuration loaded from a YAML file.
//!
//! Every key is optional; anything missing falls back to the defaults below.
//!
//! ```yaml
//! startUrls:
//!   - https://dantri.com.vn/
//! maxDepth: 2
//! workerCount: 4
//! nonArticleTtlMs: 18000000
//! ```

use crate::error::{CrawlError, Result};
use chrono::{Duration, FixedOffset, Offset, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;
use tracing::{info, instrument, warn};
use url::Url;

/// Lower bound on the frontier size regardless of `maxUrlsPerCrawl`.
const MIN_QUEUE_CAPACITY: usize = 50_000;
/// Multiplier turning the per-crawl URL budget into a queue capacity.
const QUEUE_SAFETY_FACTOR: usize = 200;

/// Runtime settings for a crawl.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CrawlerConfig {
    /// Seed URLs, re-injected at depth 0 on every reseed tick.
    pub start_urls: Vec<String>,
    /// Hint used to size the frontier queue.
    pub max_urls_per_crawl: usize,
    /// Links are only expanded while `depth < max_depth`.
    pub max_depth: u32,
    /// Number of concurrent crawl workers.
    pub worker_count: usize,
    /// Articles older than this are recorded as visited but never saved.
    pub freshness_window_ms: i64,
    /// Minimum body length for a content layer to be accepted.
    pub min_body_length: usize,
    /// Minimum length of a single text fragment in tag scans.
    pub min_tag_length: usize,
    /// How long a non-article classification stays valid.
    pub non_article_ttl_ms: i64,
    pub reseed_interval_secs: u64,
    pub cleanup_interval_secs: u64,
    /// Politeness delay before each article fetch.
    pub request_delay_ms: u64,
    pub fetch_timeout_ms: u64,
    pub user_agent: String,
    pub referrer: String,
    /// Directory holding the visited/non-article stores and saved articles.
    pub data_dir: PathBuf,
    /// Offset assumed for dates that carry no zone information.
    pub default_utc_offset: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_urls: Vec::new(),
            max_urls_per_crawl: 100,
            max_depth: 2,
            worker_count: 4,
            freshness_window_ms: 15_552_000_000,
            min_body_length: 150,
            min_tag_length: 20,
            non_article_ttl_ms: 18_000_000,
            reseed_interval_secs: 300,
            cleanup_interval_secs: 60,
            request_delay_ms: 200,
            fetch_timeout_ms: 10_000,
            user_agent: "Mozilla/5.0".to_string(),
            referrer: "https://www.google.com".to_string(),
            data_dir: PathBuf::from("data"),
            default_utc_offset: "+07:00".to_string(),
        }
    }
}

impl CrawlerConfig {
    /// Load and validate the configuration at `path`.
    ///
    /// A missing or unreadable file is an error: this is the one failure the
    /// crawler refuses to start without.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CrawlError::Config(format!("cannot read {}: {e}", path.as_ref().display()))
        })?;
        let config = Self::from_yaml(&raw)?;
        info!(
            start_urls = config.start_urls.len(),
            workers = config.worker_count,
            max_depth = config.max_depth,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse a YAML document, then validate it.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let mut config: CrawlerConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject unusable settings, drop seed URLs that do not parse and
    /// normalize the rest (`https://host` becomes `https://host/`) so they
    /// match the form links are queued and recorded in.
    pub fn validate(&mut self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(CrawlError::Config("workerCount must be at least 1".into()));
        }
        if self.non_article_ttl_ms <= 0 {
            return Err(CrawlError::Config("nonArticleTtlMs must be positive".into()));
        }
        parse_offset(&self.default_utc_offset)?;

        self.start_urls = self
            .start_urls
            .iter()
            .filter_map(|raw| match parse_start_url(raw) {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    warn!(error = %e, "Dropping start URL that is not an absolute http(s) URL");
                    None
                }
            })
            .unique()
            .collect();
        if self.start_urls.is_empty() {
            warn!("No start URLs configured; the crawler will idle");
        }
        Ok(())
    }

    /// Capacity of the frontier queue.
    pub fn queue_capacity(&self) -> usize {
        self.max_urls_per_crawl
            .saturating_mul(QUEUE_SAFETY_FACTOR)
            .max(MIN_QUEUE_CAPACITY)
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::milliseconds(self.freshness_window_ms)
    }

    pub fn non_article_ttl(&self) -> Duration {
        Duration::milliseconds(self.non_article_ttl_ms)
    }

    pub fn reseed_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.reseed_interval_secs.max(1))
    }

    pub fn cleanup_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.cleanup_interval_secs.max(1))
    }

    pub fn request_delay(&self) -> StdDuration {
        StdDuration::from_millis(self.request_delay_ms)
    }

    pub fn fetch_timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.fetch_timeout_ms)
    }

    /// The validated default offset; falls back to UTC if called on an
    /// unvalidated config with a bad value.
    pub fn default_offset(&self) -> FixedOffset {
        parse_offset(&self.default_utc_offset).unwrap_or_else(|_| Utc.fix())
    }

    pub fn visited_store_path(&self) -> PathBuf {
        self.data_dir.join("visited_urls.txt")
    }

    pub fn non_article_store_path(&self) -> PathBuf {
        self.data_dir.join("non_article_urls.jsonl")
    }

    pub fn articles_dir(&self) -> PathBuf {
        self.data_dir.join("articles")
    }
}

fn parse_start_url(raw: &str) -> Result<Url> {
    let invalid = |source| CrawlError::InvalidUrl {
        url: raw.to_string(),
        source,
    };
    let url = Url::parse(raw.trim()).map_err(invalid)?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(invalid(url::ParseError::EmptyHost));
    }
    Ok(url)
}

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM` or `Z` into a fixed offset.
pub fn parse_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }
    let invalid = || CrawlError::Config(format!("invalid UTC offset {raw:?}"));

    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_keys_missing() {
        let config = CrawlerConfig::from_yaml("startUrls: [\"https://example.com/\"]").unwrap();
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.min_body_length, 150);
        assert_eq!(config.non_article_ttl(), Duration::hours(5));
        assert_eq!(config.start_urls, vec!["https://example.com/"]);
    }

    #[test]
    fn test_camel_case_keys() {
        let yaml = r#"
startUrls:
  - https://news.example/
maxDepth: 3
workerCount: 8
minTagLength: 10
dataDir: /tmp/crawl
"#;
        let config = CrawlerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.min_tag_length, 10);
        assert_eq!(config.visited_store_path(), PathBuf::from("/tmp/crawl/visited_urls.txt"));
    }

    #[test]
    fn test_queue_capacity_has_floor() {
        let mut config = CrawlerConfig::default();
        assert_eq!(config.queue_capacity(), 50_000);
        config.max_urls_per_crawl = 1_000;
        assert_eq!(config.queue_capacity(), 200_000);
    }

    #[test]
    fn test_invalid_start_urls_are_dropped() {
        let config =
            CrawlerConfig::from_yaml("startUrls: [\"not a url\", \"https://ok.example/\"]").unwrap();
        assert_eq!(config.start_urls, vec!["https://ok.example/"]);
    }

    #[test]
    fn test_start_urls_are_normalized_and_deduped() {
        let config = CrawlerConfig::from_yaml(
            "startUrls: [\"https://news.example\", \"https://news.example/\", \"HTTPS://Other.Example\"]",
        )
        .unwrap();
        assert_eq!(
            config.start_urls,
            vec!["https://news.example/", "https://other.example/"]
        );
    }

    #[test]
    fn test_start_url_without_host_is_invalid() {
        let err = parse_start_url("mailto:desk@news.example").unwrap_err();
        assert!(matches!(err, CrawlError::InvalidUrl { .. }));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = CrawlerConfig::from_yaml("workerCount: 0").unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("+07:00").unwrap().local_minus_utc(), 7 * 3600);
        assert_eq!(parse_offset("-0530").unwrap().local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(parse_offset("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_offset("7").is_err());
    }
}
