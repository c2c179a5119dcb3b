//! Ephemeral locks for URLs that some worker is currently processing.

use dashmap::DashSet;

/// Set of URLs claimed by a worker. Never persisted.
#[derive(Debug, Default)]
pub struct InFlightSet {
    urls: DashSet<String>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `url`. Returns `false` if someone else holds it.
    pub fn try_claim(&self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    pub fn release(&self, url: &str) {
        self.urls.remove(url);
    }

    /// Claim `url` and get a guard that releases it when dropped, including
    /// during unwinding.
    pub fn try_acquire(&self, url: &str) -> Option<InFlightGuard<'_>> {
        self.try_claim(url).then(|| InFlightGuard {
            set: self,
            url: url.to_string(),
        })
    }

    #[cfg(test)]
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Holds an in-flight claim for as long as it lives.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    set: &'a InFlightSet,
    url: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.release(&self.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_only_one_concurrent_claim_succeeds() {
        let set = Arc::new(InFlightSet::new());
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let set = Arc::clone(&set);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    set.try_claim("https://a.test/hot")
                })
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert!(!set.try_claim("https://a.test/hot"));
        set.release("https://a.test/hot");
        assert!(set.try_claim("https://a.test/hot"));
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let set = InFlightSet::new();
        {
            let _guard = set.try_acquire("https://a.test/x").expect("first claim");
            assert!(set.contains("https://a.test/x"));
            assert!(set.try_acquire("https://a.test/x").is_none());
        }
        assert!(set.is_empty());
        assert!(set.try_acquire("https://a.test/x").is_some());
    }

    #[test]
    fn test_guard_releases_on_panic() {
        let set = InFlightSet::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = set.try_acquire("https://a.test/boom").unwrap();
            panic!("extraction blew up");
        }));
        assert!(result.is_err());
        assert!(!set.contains("https://a.test/boom"));
    }
}
