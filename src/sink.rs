//! Article persistence.
//!
//! Saved articles are laid out by host and publication month:
//!
//! ```text
//! data/articles/
//! └── news.example/
//!     └── 2024/
//!         └── 03/
//!             └── 20240305_080000000_a1B2c3.json
//! ```
//!
//! The random suffix keeps two articles published in the same millisecond
//! from overwriting each other.

use crate::error::Result;
use crate::models::Article;
use async_trait::async_trait;
use rand::Rng;
use rand::distr::Alphanumeric;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument, warn};

const SUFFIX_LEN: usize = 6;

/// Destination for extracted articles.
#[async_trait]
pub trait ArticleSink: Send + Sync {
    /// Persist one article. Callers log failures and carry on.
    async fn save(&self, article: &Article) -> Result<()>;
}

/// Writes each article as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    root: PathBuf,
}

impl JsonFileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Target path for `article`, or `None` when it has no publish time.
    pub fn path_for(&self, article: &Article) -> Option<PathBuf> {
        let published = article.publish_time?;
        let host = article.host().unwrap_or_else(|| "unknown".to_string());
        let file = format!(
            "{}_{}.json",
            published.format("%Y%m%d_%H%M%S%3f"),
            random_suffix()
        );
        Some(
            self.root
                .join(host)
                .join(published.format("%Y").to_string())
                .join(published.format("%m").to_string())
                .join(file),
        )
    }
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect()
}

#[async_trait]
impl ArticleSink for JsonFileSink {
    #[instrument(level = "debug", skip_all, fields(url = %article.url))]
    async fn save(&self, article: &Article) -> Result<()> {
        let Some(path) = self.path_for(article) else {
            warn!("Article has no publish time; not saving");
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_string_pretty(article)?;
        fs::write(&path, json).await?;
        info!(
            url = %article.url,
            layer = %article.parse_layer,
            path = %path.display(),
            "Saved article"
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps saved articles in memory.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub saved: Mutex<Vec<Article>>,
    }

    impl RecordingSink {
        pub fn urls(&self) -> Vec<String> {
            self.saved.lock().unwrap().iter().map(|a| a.url.clone()).collect()
        }
    }

    #[async_trait]
    impl ArticleSink for RecordingSink {
        async fn save(&self, article: &Article) -> Result<()> {
            self.saved.lock().unwrap().push(article.clone());
            Ok(())
        }
    }
}
