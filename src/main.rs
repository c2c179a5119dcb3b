//! # newsfront
//!
//! A breadth-first crawler for news sites. Starting from a handful of seed
//! pages it follows same-host links to a fixed depth, recognizes which pages
//! are articles, and saves the recent ones as JSON.
//!
//! ## Usage
//!
//! ```sh
//! newsfront --config config.yaml --workers 8
//! ```
//!
//! ## Architecture
//!
//! 1. **Seeding**: start URLs are pushed into a bounded frontier every few minutes
//! 2. **Dedup**: visited, non-article and in-flight stores are consulted per URL
//! 3. **Extraction**: content, date, author and category each resolved by a
//!    fallback chain (JSON-LD, page metadata, generic heuristics)
//! 4. **Output**: fresh articles are written under `<dataDir>/articles/`
//! 5. **Expansion**: same-host outlinks are queued one level deeper

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod crawler;
mod error;
mod extract;
mod feeder;
mod fetch;
mod frontier;
mod links;
mod models;
mod sink;
mod stores;
mod utils;
mod worker;

use cli::Cli;
use config::CrawlerConfig;
use crawler::Crawler;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init ---
    let filter = match &args.log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "newsfront starting up");
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration: the only fatal failure ----
    let mut config = match CrawlerConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %args.config.display(), error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    args.apply(&mut config)?;

    let summary = Crawler::new(config)?.run().await?;
    info!(
        visited = summary.visited,
        non_articles = summary.non_articles,
        dropped_pending = summary.pending,
        "Execution complete"
    );
    Ok(())
}
