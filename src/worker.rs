//! The crawl worker loop.
//!
//! Each task moves through the same steps:
//!
//! 1. Seeds are fetched only for their links and never classified.
//! 2. Anything already visited, cached as a non-article, or claimed by another
//!    worker is skipped without a fetch.
//! 3. Otherwise the page is fetched under an in-flight claim, extracted, and
//!    either saved (fresh), recorded as visited (stale), or cached as a
//!    non-article (no dated article found, or the fetch failed).
//! 4. While `depth < max_depth` the page's same-host links are queued one
//!    level deeper.
//!
//! HTML is parsed and dropped inside synchronous helpers so no `scraper`
//! document is ever held across an `.await`.

use crate::extract::ArticleExtractor;
use crate::extract::page::Page;
use crate::fetch::PageFetcher;
use crate::frontier::{Frontier, PushOutcome};
use crate::links::same_host_links;
use crate::models::{Article, UrlTask};
use crate::sink::ArticleSink;
use crate::stores::{InFlightSet, NonArticleCache, VisitedRecord};
use chrono::{Duration, Utc};
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration as StdDuration;
use tracing::{debug, error, info, instrument};

/// How long an idle worker waits on the frontier before re-checking the
/// shutdown flag.
const POLL_INTERVAL: StdDuration = StdDuration::from_millis(500);

/// Everything the workers share.
pub struct CrawlContext {
    pub frontier: Arc<Frontier>,
    pub visited: Arc<VisitedRecord>,
    pub non_articles: Arc<NonArticleCache>,
    pub in_flight: Arc<InFlightSet>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub sink: Arc<dyn ArticleSink>,
    pub extractor: ArticleExtractor,
    pub seeds: HashSet<String>,
    pub max_depth: u32,
    pub freshness_window: Duration,
    pub request_delay: StdDuration,
    pub shutdown: Arc<AtomicBool>,
}

/// What happened to one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// A seed was expanded; `queued` outlinks were added.
    SeedExpanded { queued: usize },
    SkippedVisited,
    SkippedNonArticle,
    SkippedInFlight,
    /// A fresh article went to the sink.
    Saved { queued: usize },
    /// A dated article older than the freshness window.
    Stale { queued: usize },
    /// No dated article, or the fetch failed.
    NonArticle { queued: usize },
}

#[derive(Debug, Clone, Copy)]
enum Verdict {
    Saved,
    Stale,
    NonArticle,
}

impl Verdict {
    fn with_queued(self, queued: usize) -> TaskOutcome {
        match self {
            Verdict::Saved => TaskOutcome::Saved { queued },
            Verdict::Stale => TaskOutcome::Stale { queued },
            Verdict::NonArticle => TaskOutcome::NonArticle { queued },
        }
    }
}

/// Result of the synchronous parse step.
struct Analysis {
    article: Option<Article>,
    links: Vec<String>,
}

pub struct CrawlWorker {
    id: usize,
    ctx: Arc<CrawlContext>,
}

impl CrawlWorker {
    pub fn new(id: usize, ctx: Arc<CrawlContext>) -> Self {
        Self { id, ctx }
    }

    /// Pull tasks until the shutdown flag is set. The flag is checked after
    /// every pop, so a task taken after shutdown is dropped unprocessed.
    #[instrument(level = "info", skip_all, fields(worker = self.id))]
    pub async fn run(self) {
        info!("Worker started");
        while !self.stopping() {
            let Some(task) = self.ctx.frontier.pop_timeout(POLL_INTERVAL).await else {
                continue;
            };
            if self.stopping() {
                break;
            }
            if let Some(outcome) = self.handle(task).await {
                debug!(?outcome, "Task finished");
            }
        }
        info!("Worker stopped");
    }

    fn stopping(&self) -> bool {
        self.ctx.shutdown.load(Ordering::Acquire)
    }

    /// [`CrawlWorker::process`] with panics caught and logged. `None` means
    /// the task panicked.
    pub async fn handle(&self, task: UrlTask) -> Option<TaskOutcome> {
        let url = task.url().to_string();
        match AssertUnwindSafe(self.process(task)).catch_unwind().await {
            Ok(outcome) => Some(outcome),
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                error!(%url, %reason, "Task panicked; continuing with next task");
                None
            }
        }
    }

    #[instrument(level = "debug", skip_all, fields(url = %task.url(), depth = task.depth()))]
    pub async fn process(&self, task: UrlTask) -> TaskOutcome {
        let ctx = &self.ctx;
        let url = task.url();

        if ctx.seeds.contains(url) {
            let queued = self.expand_seed(&task).await;
            return TaskOutcome::SeedExpanded { queued };
        }
        if ctx.visited.is_visited(url) {
            debug!("Skip, already visited");
            return TaskOutcome::SkippedVisited;
        }
        if ctx.non_articles.is_non_article(url) {
            debug!("Skip, cached non-article");
            return TaskOutcome::SkippedNonArticle;
        }
        let Some(_claim) = ctx.in_flight.try_acquire(url) else {
            debug!("Skip, in flight elsewhere");
            return TaskOutcome::SkippedInFlight;
        };

        if !ctx.request_delay.is_zero() {
            tokio::time::sleep(ctx.request_delay).await;
        }
        let analysis = match ctx.fetcher.fetch(url).await {
            Ok(html) => self.analyze(url, &html, task.depth()),
            Err(e) => {
                debug!(error = %e, "Fetch failed; treating as non-article");
                Analysis {
                    article: None,
                    links: Vec::new(),
                }
            }
        };

        let dated = analysis.article.filter(|a| a.publish_time.is_some());
        let verdict = match dated {
            Some(article) if self.is_fresh(&article) => {
                if let Err(e) = ctx.sink.save(&article).await {
                    error!(error = %e, "Failed to save article");
                }
                ctx.visited.mark_visited(url);
                Verdict::Saved
            }
            Some(article) => {
                debug!(published = ?article.publish_time, "Article too old to save");
                ctx.visited.mark_visited(url);
                Verdict::Stale
            }
            None => {
                ctx.non_articles.mark_non_article(url);
                Verdict::NonArticle
            }
        };

        // The claim on `url` is still held, so a self-link is not re-queued.
        let queued = self.enqueue(&analysis.links, task.depth() + 1);
        verdict.with_queued(queued)
    }

    /// Fetch a seed for its links only.
    async fn expand_seed(&self, task: &UrlTask) -> usize {
        if task.depth() >= self.ctx.max_depth {
            return 0;
        }
        match self.ctx.fetcher.fetch(task.url()).await {
            Ok(html) => {
                let links = same_host_links(&Page::parse(task.url(), &html));
                self.enqueue(&links, task.depth() + 1)
            }
            Err(e) => {
                debug!(error = %e, "Seed fetch failed");
                0
            }
        }
    }

    fn analyze(&self, url: &str, html: &str, depth: u32) -> Analysis {
        let page = Page::parse(url, html);
        let article = self.ctx.extractor.extract_page(&page);
        let links = if depth < self.ctx.max_depth {
            same_host_links(&page)
        } else {
            Vec::new()
        };
        Analysis { article, links }
    }

    fn is_fresh(&self, article: &Article) -> bool {
        article.publish_time.is_some_and(|published| {
            Utc::now().signed_duration_since(published) <= self.ctx.freshness_window
        })
    }

    /// Queue `links` at `depth`, skipping anything visited, cached as a
    /// non-article, or currently in flight. The in-flight claim is taken
    /// only for the push itself.
    fn enqueue(&self, links: &[String], depth: u32) -> usize {
        let ctx = &self.ctx;
        let mut queued = 0;
        for link in links {
            if ctx.visited.is_visited(link) || ctx.non_articles.is_non_article(link) {
                continue;
            }
            if !ctx.in_flight.try_claim(link) {
                continue;
            }
            if ctx.frontier.push(UrlTask::new(link.as_str(), depth)) == PushOutcome::Queued {
                queued += 1;
            }
            ctx.in_flight.release(link);
        }
        if queued > 0 {
            debug!(queued, depth, "Queued outlinks");
        }
        queued
    }
}
