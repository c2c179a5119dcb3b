//! Command-line interface definitions.
//!
//! Flags override the matching keys of the YAML configuration file.

use crate::config::CrawlerConfig;
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// Breadth-first news crawler.
///
/// # Examples
///
/// ```sh
/// # Crawl with ./config.yaml
/// newsfront
///
/// # Another config, more workers, debug logging
/// newsfront -c sites/dantri.yaml -w 8 --log-level debug
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "NEWSFRONT_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Directory for the URL stores and saved articles
    #[arg(short, long, env = "NEWSFRONT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Number of concurrent crawl workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Maximum link depth below the start URLs
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Log filter (e.g. `debug` or `newsfront=trace`); overrides RUST_LOG
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Apply flag overrides to a loaded configuration and re-validate it.
    pub fn apply(&self, config: &mut CrawlerConfig) -> Result<()> {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(workers) = self.workers {
            config.worker_count = workers;
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["newsfront"]);
        assert!(cli.workers.is_none());
        assert!(cli.max_depth.is_none());
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["newsfront", "-c", "/etc/newsfront.yaml", "-d", "/tmp/data", "-w", "8"]);
        assert_eq!(cli.config, PathBuf::from("/etc/newsfront.yaml"));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/data")));
        assert_eq!(cli.workers, Some(8));
    }

    #[test]
    fn test_apply_overrides() {
        let cli = Cli::parse_from(["newsfront", "--max-depth", "5", "--workers", "2", "--data-dir", "/srv/crawl"]);
        let mut config = CrawlerConfig::default();
        cli.apply(&mut config).unwrap();
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.data_dir, PathBuf::from("/srv/crawl"));
    }

    #[test]
    fn test_apply_rejects_zero_workers() {
        let cli = Cli::parse_from(["newsfront", "--workers", "0"]);
        let mut config = CrawlerConfig::default();
        assert!(cli.apply(&mut config).is_err());
    }
}
