//! Defines the per-key record stored inside the cache.
//!
//! Next to the actual value, each record keeps the metadata required by the
//! expiration and eviction machinery: an absolute expiry timestamp, the
//! timestamp of the most recent use and a use counter.
#[cfg(test)]
use mock_instant::Instant;
#[cfg(not(test))]
use std::time::Instant;

use std::time::Duration;

/// A single cached value along with its usage metadata.
pub(crate) struct CacheEntry<V> {
    /// The stored value.
    pub(crate) value: V,

    /// Counts how often this entry was read or overwritten.
    pub(crate) uses: u64,

    /// The timestamp of the most recent read or overwrite.
    pub(crate) last_used_on: Instant,

    /// The timestamp after which this entry is treated as absent.
    pub(crate) expires_on: Instant,
}

impl<V> CacheEntry<V> {
    /// Creates a fresh entry which expires once the given window has elapsed.
    pub(crate) fn new(value: V, now: Instant, window: Duration) -> Self {
        CacheEntry {
            value,
            uses: 0,
            last_used_on: now,
            expires_on: now + window,
        }
    }

    /// Determines if this entry has passed its expiry.
    ///
    /// An entry counts as expired the very moment its expiry is reached.
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.expires_on <= now
    }

    /// Records a successful read or overwrite of this entry.
    ///
    /// This bumps the use counter and the last-used timestamp. If `sliding` is
    /// set, the expiry is also pushed to `now + window`. Callers must not invoke
    /// this for an entry which has already expired, such an entry has to be
    /// removed instead.
    pub(crate) fn record_use(&mut self, now: Instant, window: Duration, sliding: bool) {
        self.uses += 1;
        self.last_used_on = now;

        if sliding {
            self.expires_on = now + window;
        }
    }

    /// Replaces the stored value and records the write as a use.
    pub(crate) fn overwrite(&mut self, value: V, now: Instant, window: Duration, sliding: bool) {
        self.value = value;
        self.record_use(now, window, sliding);
    }

    /// Installs a fresh expiry without touching the use metadata.
    pub(crate) fn renew(&mut self, now: Instant, window: Duration) {
        self.expires_on = now + window;
    }

    /// Returns the remaining time until this entry expires.
    pub(crate) fn remaining(&self, now: Instant) -> Duration {
        if self.expires_on > now {
            self.expires_on - now
        } else {
            Duration::ZERO
        }
    }

    /// Yields the rank used to select an eviction victim.
    ///
    /// Candidates are compared by expiry first, then by the last use and
    /// finally by the use counter. The entry with the smallest rank is evicted.
    pub(crate) fn eviction_rank(&self) -> (Instant, Instant, u64) {
        (self.expires_on, self.last_used_on, self.uses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SHARED_TEST_RESOURCES;
    use mock_instant::MockClock;

    #[test]
    fn fresh_entries_are_not_expired() {
        let _guard = SHARED_TEST_RESOURCES.lock().unwrap();

        let now = Instant::now();
        let entry = CacheEntry::new(42, now, Duration::from_millis(10));

        assert_eq!(entry.uses, 0);
        assert_eq!(entry.last_used_on, now);
        assert!(!entry.is_expired(now));
    }

    #[test]
    fn entries_expire_exactly_at_their_expiry() {
        let _guard = SHARED_TEST_RESOURCES.lock().unwrap();

        let now = Instant::now();
        let entry = CacheEntry::new(42, now, Duration::from_millis(10));

        assert!(!entry.is_expired(now + Duration::from_millis(9)));
        assert!(entry.is_expired(now + Duration::from_millis(10)));
        assert!(entry.is_expired(now + Duration::from_millis(11)));
    }

    #[test]
    fn recording_a_use_updates_the_metadata() {
        let _guard = SHARED_TEST_RESOURCES.lock().unwrap();

        let window = Duration::from_millis(10);
        let now = Instant::now();
        let mut entry = CacheEntry::new(42, now, window);

        MockClock::advance(Duration::from_millis(5));
        let later = Instant::now();

        // Without sliding, a use only touches the counter and the timestamp...
        entry.record_use(later, window, false);
        assert_eq!(entry.uses, 1);
        assert_eq!(entry.last_used_on, later);
        assert_eq!(entry.expires_on, now + window);

        // ...with sliding, the expiry moves along as well.
        entry.record_use(later, window, true);
        assert_eq!(entry.uses, 2);
        assert_eq!(entry.expires_on, later + window);
    }

    #[test]
    fn overwriting_replaces_the_value_and_counts_as_use() {
        let _guard = SHARED_TEST_RESOURCES.lock().unwrap();

        let window = Duration::from_millis(10);
        let now = Instant::now();
        let mut entry = CacheEntry::new(1, now, window);

        entry.overwrite(2, now, window, false);
        assert_eq!(entry.value, 2);
        assert_eq!(entry.uses, 1);
    }

    #[test]
    fn renewing_restores_a_full_window() {
        let _guard = SHARED_TEST_RESOURCES.lock().unwrap();

        let window = Duration::from_millis(10);
        let now = Instant::now();
        let mut entry = CacheEntry::new(42, now, window);

        let much_later = now + Duration::from_millis(500);
        assert!(entry.is_expired(much_later));

        entry.renew(much_later, window);
        assert!(!entry.is_expired(much_later));
        assert_eq!(entry.expires_on, much_later + window);
        assert_eq!(entry.uses, 0);
    }

    #[test]
    fn remaining_time_counts_down_to_zero() {
        let _guard = SHARED_TEST_RESOURCES.lock().unwrap();

        let now = Instant::now();
        let entry = CacheEntry::new(42, now, Duration::from_millis(10));

        assert_eq!(
            entry.remaining(now + Duration::from_millis(4)),
            Duration::from_millis(6)
        );
        assert_eq!(
            entry.remaining(now + Duration::from_millis(25)),
            Duration::ZERO
        );
    }

    #[test]
    fn eviction_ranks_order_by_expiry_then_recency_then_uses() {
        let _guard = SHARED_TEST_RESOURCES.lock().unwrap();

        let window = Duration::from_millis(100);
        let now = Instant::now();

        let soon = CacheEntry::new(1, now, Duration::from_millis(50));
        let late = CacheEntry::new(2, now, window);
        assert!(soon.eviction_rank() < late.eviction_rank());

        let mut fresh = CacheEntry::new(3, now, window);
        fresh.record_use(now + Duration::from_millis(5), window, false);
        assert!(late.eviction_rank() < fresh.eviction_rank());

        let mut popular = CacheEntry::new(4, now, window);
        popular.record_use(now, window, false);
        assert!(late.eviction_rank() < popular.eviction_rank());
    }
}
