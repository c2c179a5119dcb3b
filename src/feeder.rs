//! Periodic re-seeding of the frontier.

use crate::frontier::{Frontier, PushOutcome};
use crate::models::UrlTask;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// Pushes every start URL at depth 0 on a fixed interval, starting
/// immediately.
pub struct SeedFeeder {
    frontier: Arc<Frontier>,
    seeds: Vec<String>,
    every: Duration,
    shutdown: Arc<AtomicBool>,
}

impl SeedFeeder {
    pub fn new(
        frontier: Arc<Frontier>,
        seeds: Vec<String>,
        every: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            frontier,
            seeds,
            every,
            shutdown,
        }
    }

    /// Queue one round of seeds. Returns how many were accepted.
    pub fn feed_once(&self) -> usize {
        let mut queued = 0;
        for seed in &self.seeds {
            match self.frontier.push(UrlTask::new(seed.as_str(), 0)) {
                PushOutcome::Queued => {
                    debug!(url = %seed, "Scheduled start URL");
                    queued += 1;
                }
                PushOutcome::Dropped => warn!(url = %seed, "Frontier full; start URL dropped"),
            }
        }
        queued
    }

    pub async fn run(self) {
        info!(seeds = self.seeds.len(), every_secs = self.every.as_secs(), "Seed feeder started");
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }
            let queued = self.feed_once();
            info!(queued, pending = self.frontier.len(), "Seeded frontier");
        }
        info!("Seed feeder stopped");
    }
}
