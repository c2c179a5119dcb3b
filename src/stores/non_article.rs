//! TTL-bounded cache of URLs that did not yield an article.
//!
//! Entries expire `ttl` after they were recorded; an expired entry is a miss.
//! Expiry found during a lookup only drops the entry from memory and flags
//! the durable file as stale. The periodic [`NonArticleCache::sweep`] removes
//! the remaining expired entries and rewrites the file at most once per run,
//! so read traffic never causes an O(n) rewrite.
//!
//! The durable file holds one JSON object per line:
//!
//! ```text
//! {"url":"https://news.example/tag/sport","skippedAt":"2025-05-06T08:15:02.114Z"}
//! ```

use crate::error::Result;
use crate::utils::blocking_io;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NonArticleLine {
    url: String,
    skipped_at: DateTime<Utc>,
}

/// Concurrent non-article cache with optional JSON-lines persistence.
#[derive(Debug)]
pub struct NonArticleCache {
    entries: DashMap<String, DateTime<Utc>>,
    ttl: Duration,
    path: Option<PathBuf>,
    writer: Mutex<()>,
    stale_on_disk: AtomicBool,
}

impl NonArticleCache {
    /// A cache that lives only in memory.
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            path: None,
            writer: Mutex::new(()),
            stale_on_disk: AtomicBool::new(false),
        }
    }

    /// Open the durable cache at `path`, loading every well-formed line.
    ///
    /// Malformed lines are logged and skipped. When a URL appears on several
    /// lines the last one wins, matching append order. Entries already
    /// expired at load time are dropped and the file is scheduled for a
    /// rewrite on the next sweep.
    ///
    /// # Arguments
    ///
    /// * `path` - JSONL store; a missing file is an empty cache and is
    ///   created on the first mark
    /// * `ttl` - How long an entry counts as a non-article
    ///
    /// # Returns
    ///
    /// The loaded cache. A file that cannot be read is logged and the cache
    /// starts empty, still appending to `path`.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let cache = NonArticleCache::open("data/non_article_urls.jsonl", Duration::hours(5));
    /// cache.mark_non_article("https://news.example/tag/sport");
    /// assert!(cache.is_non_article("https://news.example/tag/sport"));
    /// ```
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, ttl: Duration) -> Self {
        let mut cache = Self::in_memory(ttl);
        cache.path = Some(path.as_ref().to_path_buf());
        match cache.load(path.as_ref(), Utc::now()) {
            Ok(0) => {}
            Ok(count) => info!(count, "Loaded non-article URLs"),
            Err(e) => error!(error = %e, "Error reading non-article store"),
        }
        cache
    }

    fn load(&self, path: &Path, now: DateTime<Utc>) -> Result<usize> {
        if !path.exists() {
            return Ok(0);
        }
        let reader = BufReader::new(fs::File::open(path)?);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<NonArticleLine>(&line) {
                Ok(entry) => {
                    self.entries.insert(entry.url, entry.skipped_at);
                }
                Err(e) => warn!(%line, error = %e, "Skipping invalid line in non-article store"),
            }
        }
        let before = self.entries.len();
        self.entries.retain(|_, skipped_at| !self.is_expired(*skipped_at, now));
        if self.entries.len() != before {
            self.stale_on_disk.store(true, Ordering::Release);
        }
        Ok(self.entries.len())
    }

    fn is_expired(&self, skipped_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - skipped_at >= self.ttl
    }

    pub fn is_non_article(&self, url: &str) -> bool {
        self.is_non_article_at(url, Utc::now())
    }

    /// Lookup against an explicit clock.
    pub fn is_non_article_at(&self, url: &str, now: DateTime<Utc>) -> bool {
        let skipped_at = match self.entries.get(url) {
            Some(entry) => *entry,
            None => return false,
        };
        if !self.is_expired(skipped_at, now) {
            return true;
        }
        // Re-check under the shard lock: a concurrent mark may have refreshed it.
        if self
            .entries
            .remove_if(url, |_, ts| self.is_expired(*ts, now))
            .is_some()
        {
            debug!(url, "Non-article entry expired");
            self.stale_on_disk.store(true, Ordering::Release);
        }
        false
    }

    pub fn mark_non_article(&self, url: &str) {
        self.mark_non_article_at(url, Utc::now());
    }

    /// Record `url` as skipped at `now` and append one durable line.
    pub fn mark_non_article_at(&self, url: &str, now: DateTime<Utc>) {
        self.entries.insert(url.to_string(), now);
        if let Err(e) = self.append(url, now) {
            error!(url, error = %e, "Failed to append to non-article store");
        }
    }

    fn append(&self, url: &str, skipped_at: DateTime<Utc>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let line = serde_json::to_string(&NonArticleLine {
            url: url.to_string(),
            skipped_at,
        })?;
        blocking_io(|| -> Result<()> {
            let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{line}")?;
            Ok(())
        })
    }

    /// Remove expired entries and compact the durable file.
    ///
    /// The file is rewritten (temp file plus rename) only when this sweep
    /// removed something or an earlier lookup dropped an expired entry. A
    /// failed rewrite is logged and retried by the next sweep.
    ///
    /// # Returns
    ///
    /// Number of entries removed by this sweep. Entries already dropped by
    /// lookups are not counted.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let removed = cache.sweep();
    /// info!(removed, remaining = cache.len(), "Swept non-article cache");
    /// ```
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, skipped_at| !self.is_expired(*skipped_at, now));
        let removed = before.saturating_sub(self.entries.len());

        let flagged = self.stale_on_disk.swap(false, Ordering::AcqRel);
        if removed > 0 || flagged {
            if let Err(e) = self.rewrite() {
                error!(error = %e, "Failed to rewrite non-article store");
                self.stale_on_disk.store(true, Ordering::Release);
            } else {
                info!(removed, remaining = self.entries.len(), "Cleaned up expired non-article URLs");
            }
        }
        removed
    }

    /// Replace the durable file with the current in-memory contents.
    fn rewrite(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        blocking_io(|| self.rewrite_to(path))
    }

    fn rewrite_to(&self, path: &Path) -> Result<()> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("jsonl.tmp");
        {
            let mut out = BufWriter::new(fs::File::create(&tmp)?);
            for entry in self.entries.iter() {
                let line = serde_json::to_string(&NonArticleLine {
                    url: entry.key().clone(),
                    skipped_at: *entry.value(),
                })?;
                writeln!(out, "{line}")?;
            }
            out.flush()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Sweep every `every` until the task is aborted.
    pub async fn run_sweeper(self: Arc<Self>, every: std::time::Duration) {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            self.sweep();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
