//! Replay protection for consumed message and assertion IDs.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Namespace prefix for assertion IDs, keeping them apart from response IDs.
pub const ASSERTION_PREFIX: &str = "ASSERTION_";

/// Default replay window (5 minutes).
pub const DEFAULT_REPLAY_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Concurrent TTL set of IDs that have already been presented.
///
/// [`ReplayCache::check_and_record`] is an atomic test-and-set: of any
/// number of concurrent callers presenting the same ID while it is
/// remembered, exactly one is accepted. Each ID is remembered for the window
/// or until the caller's `keep_until`, whichever is later. Expired entries
/// count as absent and are overwritten on their next presentation.
#[derive(Debug)]
pub struct ReplayCache {
    /// ID to the instant it is forgotten.
    seen: DashMap<String, DateTime<Utc>>,
    window: TimeDelta,
}

impl ReplayCache {
    /// Creates an empty cache remembering IDs for `window`.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            seen: DashMap::new(),
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Records `id`, returning `true` on first sight and `false` on replay.
    pub fn check_and_record(&self, id: &str) -> bool {
        self.check_and_record_at(id, Utc::now())
    }

    /// [`ReplayCache::check_and_record`] evaluated at `now`.
    pub fn check_and_record_at(&self, id: &str, now: DateTime<Utc>) -> bool {
        self.check_and_record_until(id, now, now)
    }

    /// Records `id` at `now` and remembers it at least until `keep_until`.
    ///
    /// Callers pass the last instant at which the carrying message could
    /// still pass validation, so a message valid for longer than the window
    /// cannot be replayed once the window has passed.
    pub fn check_and_record_until(&self, id: &str, now: DateTime<Utc>, keep_until: DateTime<Utc>) -> bool {
        let expires_at = self.window_end(now).max(keep_until);
        match self.seen.entry(id.to_string()) {
            Entry::Occupied(mut entry) => {
                if now > *entry.get() {
                    entry.insert(expires_at);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(expires_at);
                true
            }
        }
    }

    /// Records an assertion ID under [`ASSERTION_PREFIX`].
    pub fn check_and_record_assertion(&self, assertion_id: &str) -> bool {
        self.check_and_record_assertion_at(assertion_id, Utc::now())
    }

    /// [`ReplayCache::check_and_record_assertion`] evaluated at `now`.
    pub fn check_and_record_assertion_at(&self, assertion_id: &str, now: DateTime<Utc>) -> bool {
        self.check_and_record_assertion_until(assertion_id, now, now)
    }

    /// [`ReplayCache::check_and_record_until`] for an assertion ID.
    pub fn check_and_record_assertion_until(
        &self,
        assertion_id: &str,
        now: DateTime<Utc>,
        keep_until: DateTime<Utc>,
    ) -> bool {
        self.check_and_record_until(&format!("{ASSERTION_PREFIX}{assertion_id}"), now, keep_until)
    }

    /// Returns true if `id` is currently remembered. Does not record.
    pub fn contains(&self, id: &str) -> bool {
        let now = Utc::now();
        self.seen.get(id).is_some_and(|expires_at| now <= *expires_at)
    }

    /// Removes expired entries, returning how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// [`ReplayCache::sweep`] evaluated at `now`.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.seen.len();
        self.seen.retain(|_, expires_at| now <= *expires_at);
        before.saturating_sub(self.seen.len())
    }

    /// Number of remembered IDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if nothing is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn window_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.window).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl Default for ReplayCache {
    fn default() -> Self {
        Self::new(DEFAULT_REPLAY_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn first_sight_accepted_replay_rejected() {
        let cache = ReplayCache::default();
        assert!(cache.check_and_record("_resp1"));
        assert!(!cache.check_and_record("_resp1"));
        assert!(cache.check_and_record("_resp2"));
        assert!(cache.contains("_resp1"));
    }

    #[test]
    fn assertion_namespace_is_separate() {
        let cache = ReplayCache::default();
        assert!(cache.check_and_record("_abc"));
        assert!(cache.check_and_record_assertion("_abc"));
        assert!(!cache.check_and_record_assertion("_abc"));
        assert!(cache.contains("ASSERTION__abc"));
    }

    #[test]
    fn stale_entry_is_accepted_again() {
        let cache = ReplayCache::default();
        let t0 = Utc::now();
        assert!(cache.check_and_record_at("_id", t0));
        assert!(!cache.check_and_record_at("_id", t0 + TimeDelta::minutes(4)));
        assert!(cache.check_and_record_at("_id", t0 + TimeDelta::minutes(6)));
    }

    #[test]
    fn keep_until_outlasts_window() {
        let cache = ReplayCache::default();
        let t0 = Utc::now();
        assert!(cache.check_and_record_until("_future", t0, t0 + TimeDelta::minutes(9)));
        assert!(!cache.check_and_record_at("_future", t0 + TimeDelta::minutes(6)));
        assert!(cache.check_and_record_at("_future", t0 + TimeDelta::minutes(10)));
    }

    #[test]
    fn earlier_keep_until_does_not_shorten_window() {
        let cache = ReplayCache::default();
        let t0 = Utc::now();
        assert!(cache.check_and_record_until("_past", t0, t0 - TimeDelta::minutes(1)));
        assert!(!cache.check_and_record_at("_past", t0 + TimeDelta::minutes(4)));
    }

    #[test]
    fn sweep_keeps_entries_held_past_window() {
        let cache = ReplayCache::default();
        let now = Utc::now();
        cache.check_and_record_until("_held", now - TimeDelta::minutes(10), now + TimeDelta::minutes(1));
        assert_eq!(cache.sweep_at(now), 0);
        assert!(cache.contains("_held"));
    }

    #[test]
    fn sweep_removes_old_entries() {
        let cache = ReplayCache::default();
        let now = Utc::now();
        cache.check_and_record_at("_old", now - TimeDelta::minutes(10));
        cache.check_and_record_at("_new", now - TimeDelta::minutes(1));

        assert_eq!(cache.sweep_at(now), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("_new"));
    }

    #[test]
    fn concurrent_presentations_accept_exactly_once() {
        let cache = Arc::new(ReplayCache::default());
        let accepted = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let accepted = Arc::clone(&accepted);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    if cache.check_and_record("_same_response") {
                        accepted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn two_racing_callers_one_wins() {
        let cache = Arc::new(ReplayCache::default());
        let barrier = Arc::new(Barrier::new(2));

        let spawn = |cache: Arc<ReplayCache>, barrier: Arc<Barrier>| {
            thread::spawn(move || {
                barrier.wait();
                cache.check_and_record("_raced")
            })
        };
        let a = spawn(Arc::clone(&cache), Arc::clone(&barrier));
        let b = spawn(Arc::clone(&cache), Arc::clone(&barrier));

        let results = [a.join().unwrap(), b.join().unwrap()];
        assert_eq!(results.iter().filter(|accepted| **accepted).count(), 1);
    }
}
