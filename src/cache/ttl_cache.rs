//! Provides the cache facade along with its internal state.
//!
//! A [TtlCache] wraps a guarded map of [CacheEntry](crate::cache::entry::CacheEntry)
//! records. All foreground operations briefly acquire a single internal lock,
//! mutate the map and return, therefore the facade can be shared freely between
//! threads. The background reaper holds only a weak reference to the shared
//! state and performs its sweeps through the very same lock, so every
//! individual operation remains atomic.
#[cfg(test)]
use mock_instant::Instant;
#[cfg(not(test))]
use std::time::Instant;

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::entry::CacheEntry;
use crate::cache::reaper::{self, ReaperToken};
use crate::cache::settings::{CacheSettings, DEFAULT_CAPACITY, MIN_EXPIRATION_WINDOW};
use crate::error::{CacheError, Result};

/// Provides a thread-safe map in which every entry expires after a
/// configurable window.
///
/// A cache behaves just like a **Map** as long as its entries are young: values
/// which were put into the cache can be read back, overwritten and removed. An
/// entry which has passed its expiry however is reported as absent, no matter
/// whether it is still physically present or not. With *sliding expiration*
/// enabled (the default), every successful read grants the touched entry a
/// fresh window.
///
/// The number of entries is limited by the configured capacity. If another
/// entry is inserted into a full cache, the entry closest to its expiry is
/// dropped, with ties broken by the least recently and then least frequently
/// used one.
///
/// Expired entries which are never observed again are collected by a
/// background reaper which runs while the cache holds data (see
/// [is_polling](TtlCache::is_polling)). The reaper requires a running
/// [tokio](https://tokio.rs/) runtime; alternatively it can be disabled by
/// configuring a zero polling interval, in which case the cache never spawns a
/// task.
///
/// Once a cache is no longer needed it can be torn down via
/// [dispose](TtlCache::dispose) (dropping it has the same effect). Every
/// operation invoked after that fails with [CacheError::Disposed].
///
/// # Examples
/// ```
/// # use larder::{CacheSettings, TtlCache};
/// # #[tokio::main]
/// # async fn main() {
/// let cache = TtlCache::new(CacheSettings::new().with_capacity(128));
///
/// cache.put("Foo", "Bar".to_owned()).unwrap();
/// assert_eq!(cache.get(&"Foo").unwrap(), "Bar");
///
/// // Unknown keys are reported as absent rather than as an error...
/// assert_eq!(cache.try_get(&"Unknown").unwrap(), None);
/// # }
/// ```
pub struct TtlCache<K, V> {
    shared: Arc<Shared<K, V>>,
}

/// The state shared between the facade and its reaper task.
pub(crate) struct Shared<K, V> {
    disposed: AtomicBool,
    state: Mutex<State<K, V>>,
}

/// The guarded interior: the map itself, the effective settings and the usage
/// metrics. All fields are only ever touched while holding the lock.
struct State<K, V> {
    map: HashMap<K, CacheEntry<V>>,
    capacity: usize,
    expiration_window: Duration,
    use_sliding_expiration: bool,
    polling_interval: Duration,
    polling_suppressed: bool,
    reaper: Option<Arc<ReaperToken>>,
    reads: u64,
    writes: u64,
    hits: u64,
    evictions: u64,
    expirations: u64,
}

impl<K, V> Shared<K, V> {
    /// Determines if the owning facade has been disposed.
    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Tears the cache down: cancels the reaper and drops all entries.
    ///
    /// The first call wins, further calls are ignored.
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut state = self.state.lock().unwrap();
        state.cancel_reaper();
        state.map.clear();
    }
}

impl<K, V> Shared<K, V>
where
    K: Eq + Hash,
{
    /// Performs a single reaper sweep.
    ///
    /// Removes every entry which has passed its expiry. Returns `false` once
    /// the calling task should terminate, which is the case if the facade has
    /// been disposed or if the cache is (or just ran) empty.
    pub(crate) fn sweep(&self, token: &Arc<ReaperToken>) -> bool {
        if self.is_disposed() {
            return false;
        }

        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;

        if state.map.is_empty() {
            state.release_reaper(token);
            return false;
        }

        let removed = state.purge_expired(Instant::now());
        if removed > 0 {
            log::debug!("Cache reaper removed {} expired entries...", removed);
        }

        if state.map.is_empty() {
            state.release_reaper(token);
            return false;
        }

        true
    }
}

impl<K, V> State<K, V> {
    /// Cancels the currently installed reaper token (if any).
    fn cancel_reaper(&mut self) {
        if let Some(token) = self.reaper.take() {
            token.cancel();
        }
    }

    /// Cancels the given token and uninstalls it if it is still the current
    /// one.
    ///
    /// A sweeping task might race with a foreground operation which has
    /// already installed a fresh token (e.g. after the polling interval was
    /// changed). Such a stale task must only terminate itself and leave the
    /// fresh token untouched.
    fn release_reaper(&mut self, token: &Arc<ReaperToken>) {
        match self.reaper.as_ref() {
            Some(current) if Arc::ptr_eq(current, token) => self.cancel_reaper(),
            _ => token.cancel(),
        }
    }
}

impl<K, V> State<K, V>
where
    K: Eq + Hash,
{
    /// Removes all entries which have passed their expiry and returns how many
    /// were dropped.
    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.map.len();
        self.map.retain(|_, entry| !entry.is_expired(now));

        let removed = before - self.map.len();
        self.expirations += removed as u64;
        removed
    }
}

impl<K, V> State<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Drops the entry with the smallest eviction rank to make room.
    ///
    /// The rank orders by expiry first, then by the last use and finally by
    /// the use counter: under pressure the cache prefers to give up entries
    /// which would have died soon anyway. The victim is determined by a plain
    /// scan. The rank of an entry changes with every read, therefore
    /// maintaining an index would cost more than the occasional scan of a
    /// capacity-bounded map.
    fn evict_one(&mut self) {
        let victim = self
            .map
            .iter()
            .min_by(|(_, left), (_, right)| left.eviction_rank().cmp(&right.eviction_rank()))
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            let _ = self.map.remove(&key);
            self.evictions += 1;
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Send + 'static,
{
    /// Creates a cache with the given settings.
    ///
    /// Out-of-range settings are clamped rather than rejected: a zero capacity
    /// becomes [DEFAULT_CAPACITY](crate::cache::DEFAULT_CAPACITY) and the
    /// expiration window is raised to at least
    /// [MIN_EXPIRATION_WINDOW](crate::cache::MIN_EXPIRATION_WINDOW).
    ///
    /// # Examples
    /// ```
    /// # use larder::{CacheSettings, TtlCache};
    /// # use std::time::Duration;
    /// let cache: TtlCache<String, i32> = TtlCache::new(
    ///     CacheSettings::new()
    ///         .with_capacity(0)
    ///         .with_polling_interval(Duration::ZERO),
    /// );
    ///
    /// // The zero capacity was clamped to the default...
    /// assert_eq!(cache.capacity().unwrap(), 1024);
    /// ```
    pub fn new(settings: CacheSettings) -> Self {
        let capacity = if settings.capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            settings.capacity
        };

        TtlCache {
            shared: Arc::new(Shared {
                disposed: AtomicBool::new(false),
                state: Mutex::new(State {
                    map: HashMap::new(),
                    capacity,
                    expiration_window: settings.expiration_window.max(MIN_EXPIRATION_WINDOW),
                    use_sliding_expiration: settings.use_sliding_expiration,
                    polling_interval: settings.polling_interval,
                    polling_suppressed: false,
                    reaper: None,
                    reads: 0,
                    writes: 0,
                    hits: 0,
                    evictions: 0,
                    expirations: 0,
                }),
            }),
        }
    }

    /// Creates a cache with all settings at their defaults.
    pub fn with_defaults() -> Self {
        TtlCache::new(CacheSettings::new())
    }

    /// Stores the given value for the given key.
    ///
    /// If the key is already present, its value is overwritten in place, which
    /// counts as a use of the entry. With sliding expiration enabled this also
    /// grants the entry a fresh window. If the key is new and the cache is
    /// full, one entry is evicted first (see [TtlCache]).
    ///
    /// The insert which transitions the cache from empty to non-empty arms the
    /// background reaper, unless polling is disabled or suppressed.
    ///
    /// # Examples
    /// ```
    /// # use larder::{CacheSettings, TtlCache};
    /// # #[tokio::main]
    /// # async fn main() {
    /// let cache = TtlCache::new(CacheSettings::new());
    ///
    /// cache.put("Foo", 1).unwrap();
    /// cache.put("Foo", 2).unwrap();
    /// assert_eq!(cache.get(&"Foo").unwrap(), 2);
    /// assert_eq!(cache.len().unwrap(), 1);
    /// # }
    /// ```
    pub fn put(&self, key: K, value: V) -> Result<()> {
        self.guard()?;

        let mut guard = self.shared.state.lock().unwrap();
        let state = &mut *guard;

        let now = Instant::now();
        let window = state.expiration_window;
        let sliding = state.use_sliding_expiration;
        state.writes += 1;

        if let Some(entry) = state.map.get_mut(&key) {
            entry.overwrite(value, now, window, sliding);
            return Ok(());
        }

        if state.map.len() >= state.capacity {
            state.evict_one();
        }

        let was_empty = state.map.is_empty();
        let _ = state.map.insert(key, CacheEntry::new(value, now, window));

        if was_empty {
            self.arm_reaper(state);
        }

        Ok(())
    }

    /// Returns the value stored for the given key.
    ///
    /// A successful read counts as a use of the entry and, with sliding
    /// expiration enabled, grants it a fresh window.
    ///
    /// # Errors
    /// Fails with [CacheError::NotFound] if the key is unknown or if its entry
    /// has passed its expiry. In the latter case the entry is removed on the
    /// spot. Callers which expect misses should prefer
    /// [try_get](TtlCache::try_get).
    ///
    /// # Examples
    /// ```
    /// # use larder::{CacheError, CacheSettings, TtlCache};
    /// # #[tokio::main]
    /// # async fn main() {
    /// let cache = TtlCache::new(CacheSettings::new());
    ///
    /// cache.put("Foo", 42).unwrap();
    /// assert_eq!(cache.get(&"Foo").unwrap(), 42);
    /// assert_eq!(cache.get(&"Bar"), Err(CacheError::NotFound));
    /// # }
    /// ```
    pub fn get(&self, key: &K) -> Result<V>
    where
        V: Clone,
    {
        match self.lookup(key)? {
            Some(value) => Ok(value),
            None => Err(CacheError::NotFound),
        }
    }

    /// Returns the value stored for the given key or `None` if there is no
    /// live entry.
    ///
    /// This behaves exactly like [get](TtlCache::get) except that a miss is a
    /// regular outcome instead of an error.
    pub fn try_get(&self, key: &K) -> Result<Option<V>>
    where
        V: Clone,
    {
        self.lookup(key)
    }

    /// Removes the entry for the given key.
    ///
    /// Returns `true` if an entry was physically present, no matter whether it
    /// was still live or already past its expiry.
    pub fn remove(&self, key: &K) -> Result<bool> {
        self.guard()?;

        let mut guard = self.shared.state.lock().unwrap();
        let state = &mut *guard;
        state.writes += 1;

        let removed = state.map.remove(key).is_some();
        if removed && state.map.is_empty() {
            state.cancel_reaper();
        }

        Ok(removed)
    }

    /// Removes the entry for the given key, but only if it still carries the
    /// given value.
    ///
    /// Returns `true` if the entry was removed because its value matched. An
    /// entry past its expiry never matches; it is removed as expired and
    /// `false` is returned.
    pub fn remove_pair(&self, key: &K, value: &V) -> Result<bool>
    where
        V: PartialEq,
    {
        enum Found {
            Absent,
            Expired,
            Match,
            Mismatch,
        }

        self.guard()?;

        let mut guard = self.shared.state.lock().unwrap();
        let state = &mut *guard;

        let now = Instant::now();
        state.writes += 1;

        let found = match state.map.get(key) {
            None => Found::Absent,
            Some(entry) if entry.is_expired(now) => Found::Expired,
            Some(entry) if entry.value == *value => Found::Match,
            Some(_) => Found::Mismatch,
        };

        match found {
            Found::Expired => {
                let _ = state.map.remove(key);
                state.expirations += 1;
                if state.map.is_empty() {
                    state.cancel_reaper();
                }
                Ok(false)
            }
            Found::Match => {
                let _ = state.map.remove(key);
                if state.map.is_empty() {
                    state.cancel_reaper();
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Determines if a live entry exists for the given key.
    ///
    /// Unlike [get](TtlCache::get) this does not count as a use of the entry
    /// and never extends its lifetime. An entry which turns out to be past its
    /// expiry is removed.
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        self.guard()?;

        let mut guard = self.shared.state.lock().unwrap();
        let state = &mut *guard;

        let now = Instant::now();
        let expired = match state.map.get(key) {
            None => return Ok(false),
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            let _ = state.map.remove(key);
            state.expirations += 1;
            if state.map.is_empty() {
                state.cancel_reaper();
            }
            return Ok(false);
        }

        Ok(true)
    }

    /// Determines if any live entry carries the given value.
    ///
    /// This is a linear scan. Entries past their expiry are removed along the
    /// way and never match.
    pub fn contains_value(&self, value: &V) -> Result<bool>
    where
        V: PartialEq,
    {
        self.guard()?;

        let mut guard = self.shared.state.lock().unwrap();
        let state = &mut *guard;

        let _ = state.purge_expired(Instant::now());
        if state.map.is_empty() {
            state.cancel_reaper();
        }

        Ok(state.map.values().any(|entry| entry.value == *value))
    }

    /// Removes all entries and stops the reaper.
    ///
    /// Note that this also zeroes all usage metrics (reads, writes, hits,
    /// evictions and expirations).
    pub fn clear(&self) -> Result<()> {
        self.guard()?;

        let mut guard = self.shared.state.lock().unwrap();
        let state = &mut *guard;

        state.cancel_reaper();
        state.map.clear();
        state.reads = 0;
        state.writes = 0;
        state.hits = 0;
        state.evictions = 0;
        state.expirations = 0;

        Ok(())
    }

    /// Removes all entries which have passed their expiry and returns how many
    /// were dropped.
    ///
    /// This is the same work a single reaper sweep performs. If the sweep
    /// leaves the cache empty, the reaper is stopped; the next insert will arm
    /// it again.
    pub fn clear_expired(&self) -> Result<usize> {
        self.guard()?;

        let mut guard = self.shared.state.lock().unwrap();
        let state = &mut *guard;

        let removed = state.purge_expired(Instant::now());
        if state.map.is_empty() {
            state.cancel_reaper();
        }

        Ok(removed)
    }

    /// Grants every entry a fresh expiration window.
    ///
    /// This also resurrects entries which have already passed their expiry but
    /// have not been removed yet. Use counters and last-used timestamps remain
    /// untouched, as does the state of the reaper.
    ///
    /// # Examples
    /// ```
    /// # use larder::{CacheSettings, TtlCache};
    /// # use std::time::Duration;
    /// let cache = TtlCache::new(
    ///     CacheSettings::new()
    ///         .with_expiration_window(Duration::from_millis(50))
    ///         .with_sliding_expiration(false)
    ///         .with_polling_interval(Duration::ZERO),
    /// );
    ///
    /// cache.put("Foo", 9).unwrap();
    /// std::thread::sleep(Duration::from_millis(100));
    ///
    /// // The entry has expired, but revive grants it a fresh lifetime...
    /// cache.revive().unwrap();
    /// assert_eq!(cache.get(&"Foo").unwrap(), 9);
    /// ```
    pub fn revive(&self) -> Result<()> {
        self.guard()?;

        let mut guard = self.shared.state.lock().unwrap();
        let state = &mut *guard;

        let now = Instant::now();
        let window = state.expiration_window;
        for entry in state.map.values_mut() {
            entry.renew(now, window);
        }

        Ok(())
    }

    /// Lifts a previous [stop_polling](TtlCache::stop_polling) and re-arms the
    /// reaper if the cache currently holds data.
    pub fn start_polling(&self) -> Result<()> {
        self.guard()?;

        let mut guard = self.shared.state.lock().unwrap();
        let state = &mut *guard;

        state.polling_suppressed = false;
        if !state.map.is_empty() {
            self.arm_reaper(state);
        }

        Ok(())
    }

    /// Stops the reaper and keeps it off until
    /// [start_polling](TtlCache::start_polling) is invoked.
    ///
    /// While polling is suppressed, inserts do not arm the reaper either.
    /// Expired entries are then only removed when they are observed by a
    /// foreground operation.
    pub fn stop_polling(&self) -> Result<()> {
        self.guard()?;

        let mut guard = self.shared.state.lock().unwrap();
        let state = &mut *guard;

        state.polling_suppressed = true;
        state.cancel_reaper();

        Ok(())
    }

    /// Determines if the background reaper is currently armed.
    ///
    /// This yields `true` while a reaper task is running, which requires that
    /// the cache holds data, that polling is neither disabled nor suppressed
    /// and that the task has not been cancelled.
    ///
    /// # Examples
    /// ```
    /// # use larder::{CacheSettings, TtlCache};
    /// # #[tokio::main]
    /// # async fn main() {
    /// let cache = TtlCache::new(CacheSettings::new());
    /// assert_eq!(cache.is_polling().unwrap(), false);
    ///
    /// // The first insert arms the reaper...
    /// cache.put("Foo", 1).unwrap();
    /// assert_eq!(cache.is_polling().unwrap(), true);
    ///
    /// // ...which stands down once the cache is cleared.
    /// cache.clear().unwrap();
    /// assert_eq!(cache.is_polling().unwrap(), false);
    /// # }
    /// ```
    pub fn is_polling(&self) -> Result<bool> {
        self.guard()?;

        let state = self.shared.state.lock().unwrap();
        let armed = state
            .reaper
            .as_ref()
            .map_or(false, |token| !token.is_cancelled());

        Ok(armed && !state.map.is_empty() && !state.polling_suppressed)
    }

    /// Copies a snapshot of all key/value pairs into the given slice, starting
    /// at `offset`.
    ///
    /// The snapshot is taken under the internal lock and therefore internally
    /// consistent. Like [len](TtlCache::len) it includes entries which have
    /// passed their expiry but have not been collected yet.
    ///
    /// # Errors
    /// Fails with [CacheError::InvalidArgument] if `offset` lies beyond the
    /// destination and with [CacheError::InsufficientCapacity] if the
    /// remaining slots cannot take all entries.
    pub fn copy_to(&self, destination: &mut [(K, V)], offset: usize) -> Result<()>
    where
        V: Clone,
    {
        self.guard()?;

        let state = self.shared.state.lock().unwrap();

        if offset > destination.len() {
            return Err(CacheError::InvalidArgument(
                "offset exceeds the destination length",
            ));
        }

        let needed = state.map.len();
        let available = destination.len() - offset;
        if needed > available {
            return Err(CacheError::InsufficientCapacity { needed, available });
        }

        for (slot, (key, entry)) in destination[offset..].iter_mut().zip(state.map.iter()) {
            *slot = (key.clone(), entry.value.clone());
        }

        Ok(())
    }

    /// Returns an iterator over a snapshot of all key/value pairs.
    ///
    /// The snapshot is taken when this method is invoked; the iterator is not
    /// affected by (and does not reflect) later modifications of the cache.
    pub fn entries(&self) -> Result<impl Iterator<Item = (K, V)>>
    where
        V: Clone,
    {
        self.guard()?;

        let state = self.shared.state.lock().unwrap();
        let snapshot: Vec<(K, V)> = state
            .map
            .iter()
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect();

        Ok(snapshot.into_iter())
    }

    /// Returns a snapshot of all keys.
    pub fn keys(&self) -> Result<Vec<K>> {
        self.guard()?;

        let state = self.shared.state.lock().unwrap();
        Ok(state.map.keys().cloned().collect())
    }

    /// Returns a snapshot of all values.
    pub fn values(&self) -> Result<Vec<V>>
    where
        V: Clone,
    {
        self.guard()?;

        let state = self.shared.state.lock().unwrap();
        Ok(state.map.values().map(|entry| entry.value.clone()).collect())
    }

    /// Returns the number of physically present entries.
    ///
    /// Note that this might include entries which have already passed their
    /// expiry but have been neither observed nor swept yet.
    pub fn len(&self) -> Result<usize> {
        self.guard()?;
        Ok(self.shared.state.lock().unwrap().map.len())
    }

    /// Determines if the cache holds no entries at all.
    pub fn is_empty(&self) -> Result<bool> {
        self.guard()?;
        Ok(self.shared.state.lock().unwrap().map.is_empty())
    }

    /// Returns the remaining lifetime of the entry for the given key.
    ///
    /// Yields `None` if there is no live entry. This is a pure inspection: it
    /// does not count as a use and never extends the lifetime of the entry. An
    /// entry which turns out to be past its expiry is removed.
    pub fn ttl_remaining(&self, key: &K) -> Result<Option<Duration>> {
        self.guard()?;

        let mut guard = self.shared.state.lock().unwrap();
        let state = &mut *guard;

        let now = Instant::now();
        let remaining = match state.map.get(key) {
            None => return Ok(None),
            Some(entry) if entry.is_expired(now) => None,
            Some(entry) => Some(entry.remaining(now)),
        };

        if remaining.is_none() {
            let _ = state.map.remove(key);
            state.expirations += 1;
            if state.map.is_empty() {
                state.cancel_reaper();
            }
        }

        Ok(remaining)
    }

    /// Returns the maximal number of entries this cache will hold.
    pub fn capacity(&self) -> Result<usize> {
        self.guard()?;
        Ok(self.shared.state.lock().unwrap().capacity)
    }

    /// Changes the maximal number of entries this cache will hold.
    ///
    /// Zero is clamped to the default capacity. If the cache currently holds
    /// more entries than the new limit permits, entries are evicted until the
    /// limit is met.
    pub fn set_capacity(&self, capacity: usize) -> Result<()> {
        self.guard()?;

        let mut guard = self.shared.state.lock().unwrap();
        let state = &mut *guard;

        state.capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };

        while state.map.len() > state.capacity {
            state.evict_one();
        }

        Ok(())
    }

    /// Returns the lifetime granted to entries when they are written.
    pub fn expiration_window(&self) -> Result<Duration> {
        self.guard()?;
        Ok(self.shared.state.lock().unwrap().expiration_window)
    }

    /// Changes the lifetime granted to entries when they are written.
    ///
    /// The value is clamped to at least one millisecond. Only future writes
    /// (and future sliding renewals) use the new window; the expiry of
    /// existing entries remains as it is.
    pub fn set_expiration_window(&self, window: Duration) -> Result<()> {
        self.guard()?;

        let mut state = self.shared.state.lock().unwrap();
        state.expiration_window = window.max(MIN_EXPIRATION_WINDOW);

        Ok(())
    }

    /// Determines if reads extend the lifetime of the touched entry.
    pub fn use_sliding_expiration(&self) -> Result<bool> {
        self.guard()?;
        Ok(self.shared.state.lock().unwrap().use_sliding_expiration)
    }

    /// Toggles whether reads extend the lifetime of the touched entry.
    pub fn set_use_sliding_expiration(&self, sliding: bool) -> Result<()> {
        self.guard()?;

        let mut state = self.shared.state.lock().unwrap();
        state.use_sliding_expiration = sliding;

        Ok(())
    }

    /// Returns the pause between two sweeps of the background reaper.
    pub fn polling_interval(&self) -> Result<Duration> {
        self.guard()?;
        Ok(self.shared.state.lock().unwrap().polling_interval)
    }

    /// Changes the pause between two sweeps of the background reaper.
    ///
    /// A zero duration stops the reaper and keeps it off, even across further
    /// inserts. A positive duration replaces a running reaper with a fresh
    /// task which sweeps at the new pace; if the cache is empty (or polling is
    /// suppressed), the new interval simply takes effect once the reaper is
    /// armed the next time.
    pub fn set_polling_interval(&self, interval: Duration) -> Result<()> {
        self.guard()?;

        let mut guard = self.shared.state.lock().unwrap();
        let state = &mut *guard;

        state.polling_interval = interval;
        if interval.is_zero() {
            state.cancel_reaper();
        } else if !state.map.is_empty() && !state.polling_suppressed {
            state.cancel_reaper();
            self.arm_reaper(state);
        }

        Ok(())
    }

    /// Returns the total number of reads performed on this cache.
    pub fn reads(&self) -> Result<u64> {
        self.guard()?;
        Ok(self.shared.state.lock().unwrap().reads)
    }

    /// Returns the total number of writes performed on this cache.
    pub fn writes(&self) -> Result<u64> {
        self.guard()?;
        Ok(self.shared.state.lock().unwrap().writes)
    }

    /// Returns the number of reads which found a live entry.
    pub fn hits(&self) -> Result<u64> {
        self.guard()?;
        Ok(self.shared.state.lock().unwrap().hits)
    }

    /// Returns the number of entries dropped to make room under capacity
    /// pressure.
    pub fn evictions(&self) -> Result<u64> {
        self.guard()?;
        Ok(self.shared.state.lock().unwrap().evictions)
    }

    /// Returns the number of entries removed because they had passed their
    /// expiry (by the reaper as well as by observing foreground operations).
    pub fn expirations(&self) -> Result<u64> {
        self.guard()?;
        Ok(self.shared.state.lock().unwrap().expirations)
    }

    /// Returns the cache hit rate in percent.
    pub fn hit_rate(&self) -> Result<f32> {
        self.guard()?;

        let state = self.shared.state.lock().unwrap();
        Ok(match state.reads {
            0 => 0.,
            reads => state.hits as f32 / reads as f32 * 100.,
        })
    }

    /// Returns the cache utilization in percent.
    pub fn utilization(&self) -> Result<f32> {
        self.guard()?;

        let state = self.shared.state.lock().unwrap();
        Ok(state.map.len() as f32 / state.capacity as f32 * 100.)
    }

    /// Tears the cache down.
    ///
    /// This cancels the reaper, drops all entries and marks the cache as
    /// disposed. Every further operation except this one and
    /// [is_disposed](TtlCache::is_disposed) fails with
    /// [CacheError::Disposed]. Invoking dispose twice is permitted, the second
    /// call has no effect. Dropping the cache disposes it as well.
    pub fn dispose(&self) {
        self.shared.dispose();
    }

    /// Determines if [dispose](TtlCache::dispose) has been invoked.
    pub fn is_disposed(&self) -> bool {
        self.shared.is_disposed()
    }

    /// Reports [CacheError::Disposed] once the cache has been torn down.
    fn guard(&self) -> Result<()> {
        if self.shared.is_disposed() {
            Err(CacheError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Looks up a key, removing the entry if it has expired.
    ///
    /// This is the shared implementation of [get](TtlCache::get) and
    /// [try_get](TtlCache::try_get).
    fn lookup(&self, key: &K) -> Result<Option<V>>
    where
        V: Clone,
    {
        self.guard()?;

        let mut guard = self.shared.state.lock().unwrap();
        let state = &mut *guard;

        let now = Instant::now();
        let window = state.expiration_window;
        let sliding = state.use_sliding_expiration;
        state.reads += 1;

        match state.map.get_mut(key) {
            None => return Ok(None),
            Some(entry) => {
                if !entry.is_expired(now) {
                    entry.record_use(now, window, sliding);
                    state.hits += 1;
                    return Ok(Some(entry.value.clone()));
                }
            }
        }

        // The entry was found but is past its expiry: remove it so that the
        // next observer no longer sees it...
        let _ = state.map.remove(key);
        state.expirations += 1;
        if state.map.is_empty() {
            state.cancel_reaper();
        }

        Ok(None)
    }

    /// Installs a fresh reaper token and spawns the matching task.
    ///
    /// Does nothing while polling is disabled or suppressed, or while a live
    /// task is already around.
    fn arm_reaper(&self, state: &mut State<K, V>) {
        if state.polling_interval.is_zero() || state.polling_suppressed {
            return;
        }

        if state
            .reaper
            .as_ref()
            .map_or(false, |token| !token.is_cancelled())
        {
            return;
        }

        let token = ReaperToken::new();
        state.reaper = Some(token.clone());
        reaper::spawn(
            Arc::downgrade(&self.shared),
            state.polling_interval,
            token,
        );
    }
}

impl<K, V> Drop for TtlCache<K, V> {
    fn drop(&mut self) {
        self.shared.dispose();
    }
}
