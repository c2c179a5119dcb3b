//! Crawl runtime: opens the stores, spawns the worker pool, the seed feeder
//! and the non-article sweeper, then waits for a stop signal.

use crate::config::CrawlerConfig;
use crate::error::Result;
use crate::extract::ArticleExtractor;
use crate::feeder::SeedFeeder;
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::frontier::Frontier;
use crate::sink::{ArticleSink, JsonFileSink};
use crate::stores::{InFlightSet, NonArticleCache, VisitedRecord};
use crate::utils::ensure_writable_dir;
use crate::worker::{CrawlContext, CrawlWorker};
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Store sizes at the moment the crawl stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    pub visited: usize,
    pub non_articles: usize,
    pub pending: usize,
}

pub struct Crawler {
    config: CrawlerConfig,
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn ArticleSink>,
}

impl Crawler {
    /// A crawler that fetches over HTTP and writes JSON files under the data
    /// directory.
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::from_config(&config)?);
        let sink = Arc::new(JsonFileSink::new(config.articles_dir()));
        Ok(Self::with_parts(config, fetcher, sink))
    }

    pub fn with_parts(
        config: CrawlerConfig,
        fetcher: Arc<dyn PageFetcher>,
        sink: Arc<dyn ArticleSink>,
    ) -> Self {
        Self {
            config,
            fetcher,
            sink,
        }
    }

    /// Crawl until Ctrl-C.
    pub async fn run(self) -> Result<CrawlSummary> {
        self.run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Stop signal received"),
                Err(e) => error!(error = %e, "Cannot listen for Ctrl-C; stopping"),
            }
        })
        .await
    }

    /// Crawl until `stop` resolves.
    ///
    /// Opens the visited and non-article stores under the data directory,
    /// spawns `workerCount` workers, the seed feeder and the non-article
    /// sweeper, then waits on `stop`. Workers finish the task they hold and
    /// exit; whatever is still queued is discarded.
    ///
    /// A data directory that cannot be written is logged and the stores run
    /// in memory only, so nothing learned in this run survives a restart.
    ///
    /// # Arguments
    ///
    /// * `stop` - Resolves when the crawl should end (Ctrl-C in [`Crawler::run`])
    ///
    /// # Returns
    ///
    /// Store sizes at shutdown as a [`CrawlSummary`].
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let summary = Crawler::new(config)?
    ///     .run_until(tokio::time::sleep(Duration::from_secs(60)))
    ///     .await?;
    /// info!(visited = summary.visited, "Crawled for a minute");
    /// ```
    #[instrument(level = "info", skip_all, fields(data_dir = %self.config.data_dir.display()))]
    pub async fn run_until(self, stop: impl Future<Output = ()>) -> Result<CrawlSummary> {
        let started = Instant::now();
        let config = &self.config;
        let (visited, non_articles) = match ensure_writable_dir(&config.data_dir).await {
            Ok(()) => (
                VisitedRecord::open(config.visited_store_path()),
                NonArticleCache::open(config.non_article_store_path(), config.non_article_ttl()),
            ),
            Err(e) => {
                error!(error = %e, "Data directory not writable; stores will run in memory only");
                (
                    VisitedRecord::in_memory(),
                    NonArticleCache::in_memory(config.non_article_ttl()),
                )
            }
        };
        let visited = Arc::new(visited);
        let non_articles = Arc::new(non_articles);
        let in_flight = Arc::new(InFlightSet::new());
        let frontier = Arc::new(Frontier::new(config.queue_capacity()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let ctx = Arc::new(CrawlContext {
            frontier: frontier.clone(),
            visited: visited.clone(),
            non_articles: non_articles.clone(),
            in_flight: in_flight.clone(),
            fetcher: self.fetcher.clone(),
            sink: self.sink.clone(),
            extractor: ArticleExtractor::from_config(config),
            seeds: config.start_urls.iter().cloned().collect(),
            max_depth: config.max_depth,
            freshness_window: config.freshness_window(),
            request_delay: config.request_delay(),
            shutdown: shutdown.clone(),
        });

        let workers: Vec<_> = (0..config.worker_count)
            .map(|id| tokio::spawn(CrawlWorker::new(id, ctx.clone()).run()))
            .collect();
        let feeder = tokio::spawn(
            SeedFeeder::new(
                frontier.clone(),
                config.start_urls.clone(),
                config.reseed_interval(),
                shutdown.clone(),
            )
            .run(),
        );
        let sweeper = tokio::spawn(non_articles.clone().run_sweeper(config.cleanup_interval()));
        info!(
            workers = config.worker_count,
            max_depth = config.max_depth,
            queue_capacity = frontier.capacity(),
            "Crawler running"
        );

        stop.await;

        shutdown.store(true, Ordering::Release);
        frontier.wake_all();
        feeder.abort();
        sweeper.abort();
        for result in join_all(workers).await {
            if let Err(e) = result {
                error!(error = %e, "Worker task ended abnormally");
            }
        }
        if !in_flight.is_empty() {
            warn!(claims = in_flight.len(), "In-flight claims left after shutdown");
        }
        non_articles.sweep();

        let summary = CrawlSummary {
            visited: visited.len(),
            non_articles: non_articles.len(),
            pending: frontier.len(),
        };
        info!(
            visited = summary.visited,
            non_articles = summary.non_articles,
            pending = summary.pending,
            elapsed_secs = started.elapsed().as_secs(),
            "Crawler stopped"
        );
        Ok(summary)
    }
}
