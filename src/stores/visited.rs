//! Permanent record of URLs already classified as articles.

use crate::error::Result;
use crate::utils::blocking_io;
use dashmap::DashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{info, instrument, warn};

/// Append-only set of visited URLs, optionally mirrored to a text file with
/// one URL per line.
#[derive(Debug, Default)]
pub struct VisitedRecord {
    urls: DashSet<String>,
    path: Option<PathBuf>,
    writer: Mutex<()>,
}

impl VisitedRecord {
    /// A record that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (or start) the durable record at `path`, loading existing lines.
    ///
    /// A missing file is an empty record. A file that cannot be read is
    /// logged and also treated as empty.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let record = Self {
            urls: DashSet::new(),
            path: Some(path.clone()),
            writer: Mutex::new(()),
        };
        match record.load(&path) {
            Ok(0) => {}
            Ok(count) => info!(count, "Loaded visited article URLs"),
            Err(e) => warn!(error = %e, "Failed to load visited URL store"),
        }
        record
    }

    fn load(&self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Ok(0);
        }
        let reader = BufReader::new(fs::File::open(path)?);
        for line in reader.lines() {
            let line = line?;
            let url = line.trim();
            if !url.is_empty() {
                self.urls.insert(url.to_string());
            }
        }
        Ok(self.urls.len())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Record `url` as visited. Returns `true` if it was not already present.
    ///
    /// Only the caller that actually inserts the URL writes the durable line,
    /// and it does so before returning.
    pub fn mark_visited(&self, url: &str) -> bool {
        if !self.urls.insert(url.to_string()) {
            return false;
        }
        if let Err(e) = self.append(url) {
            warn!(url, error = %e, "Failed to write visited URL");
        }
        true
    }

    fn append(&self, url: &str) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        blocking_io(|| -> Result<()> {
            let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{url}")?;
            Ok(())
        })
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_mark_is_idempotent() {
        let visited = VisitedRecord::in_memory();
        assert!(visited.is_empty());
        assert!(!visited.is_visited("https://a.test/x"));
        assert!(visited.mark_visited("https://a.test/x"));
        assert!(!visited.mark_visited("https://a.test/x"));
        assert!(visited.is_visited("https://a.test/x"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("visited_urls.txt");

        let visited = VisitedRecord::open(&path);
        visited.mark_visited("https://a.test/1");
        visited.mark_visited("https://a.test/2");
        visited.mark_visited("https://a.test/1");
        drop(visited);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);

        let reloaded = VisitedRecord::open(&path);
        assert!(reloaded.is_visited("https://a.test/1"));
        assert!(reloaded.is_visited("https://a.test/2"));
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn test_concurrent_marks_write_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visited_urls.txt");
        let visited = Arc::new(VisitedRecord::open(&path));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let visited = Arc::clone(&visited);
                thread::spawn(move || visited.mark_visited("https://a.test/race"))
            })
            .collect();
        let inserted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|newly| *newly)
            .count();

        assert_eq!(inserted, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "https://a.test/race\n");
    }
}
