//! Bounded crawl frontier shared by every worker.
//!
//! Producers never wait: when the queue is full the new task is dropped and
//! logged. Consumers wait on a [`Notify`] until a task arrives, optionally
//! with a timeout so they can notice a shutdown request.

use crate::models::UrlTask;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

/// Result of a non-blocking [`Frontier::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// The queue was at capacity; the task was discarded.
    Dropped,
}

/// Fixed-capacity FIFO of [`UrlTask`]s with drop-on-full backpressure.
#[derive(Debug)]
pub struct Frontier {
    queue: Mutex<VecDeque<UrlTask>>,
    capacity: usize,
    available: Notify,
}

impl Frontier {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        debug!(capacity, "Frontier created");
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(4096))),
            capacity,
            available: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueue `task` unless the frontier is full.
    pub fn push(&self, task: UrlTask) -> PushOutcome {
        {
            let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
            if queue.len() >= self.capacity {
                debug!(url = %task.url(), depth = task.depth(), "Drop URL, queue full");
                return PushOutcome::Dropped;
            }
            queue.push_back(task);
        }
        self.available.notify_one();
        PushOutcome::Queued
    }

    /// Take the oldest task without waiting.
    pub fn try_pop(&self) -> Option<UrlTask> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Wait until a task is available and take it.
    pub async fn pop(&self) -> UrlTask {
        loop {
            // Register interest before checking so a push between the check
            // and the await is not missed.
            let notified = self.available.notified();
            if let Some(task) = self.try_pop() {
                return task;
            }
            notified.await;
        }
    }

    /// Like [`Frontier::pop`], giving up after `timeout`.
    pub async fn pop_timeout(&self, timeout: Duration) -> Option<UrlTask> {
        tokio::time::timeout(timeout, self.pop()).await.ok()
    }

    /// Wake every waiting consumer; used on shutdown.
    pub fn wake_all(&self) {
        self.available.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fifo_order() {
        let frontier = Frontier::new(4);
        frontier.push(UrlTask::new("https://a.test/1", 0));
        frontier.push(UrlTask::new("https://a.test/2", 1));

        assert_eq!(frontier.pop().await.url(), "https://a.test/1");
        assert_eq!(frontier.pop().await.url(), "https://a.test/2");
        assert!(frontier.is_empty());
    }

    #[tokio::test]
    async fn test_overflow_drops_newest_task() {
        let frontier = Frontier::new(2);
        assert_eq!(frontier.push(UrlTask::new("https://a.test/1", 0)), PushOutcome::Queued);
        assert_eq!(frontier.push(UrlTask::new("https://a.test/2", 0)), PushOutcome::Queued);
        assert_eq!(frontier.push(UrlTask::new("https://a.test/3", 0)), PushOutcome::Dropped);

        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.pop().await.url(), "https://a.test/1");
        assert_eq!(frontier.pop().await.url(), "https://a.test/2");
        assert!(frontier.pop_timeout(Duration::from_millis(10)).await.is_none());
    }

    #[tokio::test]
    async fn test_pop_timeout_on_empty_queue() {
        let frontier = Frontier::new(1);
        assert!(frontier.pop_timeout(Duration::from_millis(20)).await.is_none());
    }

    #[tokio::test]
    async fn test_waiting_consumer_is_woken_by_push() {
        let frontier = Arc::new(Frontier::new(8));
        let consumer = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.pop().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        frontier.push(UrlTask::new("https://late.test/", 2));

        let task = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer woke up")
            .expect("consumer joined");
        assert_eq!(task.depth(), 2);
    }
}
