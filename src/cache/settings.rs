//! Defines the construction time settings of the cache.
//!
//! All values come with sensible defaults, therefore `CacheSettings::new()` is
//! a perfectly fine starting point. Individual values can be customized via the
//! `with_` methods. Out-of-range values are not rejected but clamped by the
//! cache on construction, as a cache with slightly surprising limits beats a
//! service which refuses to start.
use std::time::Duration;

/// The capacity used if none (or zero) is given.
pub const DEFAULT_CAPACITY: usize = 1024;

/// The expiration window used by default (15 minutes).
pub const DEFAULT_EXPIRATION_WINDOW: Duration = Duration::from_secs(15 * 60);

/// The smallest accepted expiration window.
pub const MIN_EXPIRATION_WINDOW: Duration = Duration::from_millis(1);

/// The reaper interval used by default (one minute).
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(60);

/// Describes the behavior of a [TtlCache](crate::cache::TtlCache).
///
/// # Example
/// ```
/// # use larder::CacheSettings;
/// # use std::time::Duration;
/// let settings = CacheSettings::new()
///     .with_capacity(64)
///     .with_expiration_window(Duration::from_secs(30))
///     .with_sliding_expiration(false)
///     .with_polling_interval(Duration::ZERO);
///
/// assert_eq!(settings.capacity, 64);
/// assert_eq!(settings.use_sliding_expiration, false);
/// ```
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// The maximal number of entries to keep. Zero is clamped to
    /// [DEFAULT_CAPACITY].
    pub capacity: usize,

    /// The lifetime assigned to an entry when it is written. Values below
    /// [MIN_EXPIRATION_WINDOW] are clamped to that minimum.
    pub expiration_window: Duration,

    /// If set, every successful read pushes the expiry of the touched entry to
    /// `now + expiration_window`.
    pub use_sliding_expiration: bool,

    /// The pause between two sweeps of the background reaper. A zero duration
    /// disables the reaper entirely, expired entries are then only removed
    /// when they are observed by a foreground operation.
    pub polling_interval: Duration,
}

impl CacheSettings {
    /// Creates settings with all values at their defaults.
    pub fn new() -> Self {
        CacheSettings::default()
    }

    /// Specifies the maximal number of entries to keep.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Specifies the lifetime assigned to entries when they are written.
    pub fn with_expiration_window(mut self, window: Duration) -> Self {
        self.expiration_window = window;
        self
    }

    /// Toggles whether reads extend the lifetime of the touched entry.
    pub fn with_sliding_expiration(mut self, sliding: bool) -> Self {
        self.use_sliding_expiration = sliding;
        self
    }

    /// Specifies the pause between two reaper sweeps (zero disables the reaper).
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            capacity: DEFAULT_CAPACITY,
            expiration_window: DEFAULT_EXPIRATION_WINDOW,
            use_sliding_expiration: true,
            polling_interval: DEFAULT_POLLING_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let settings = CacheSettings::new();

        assert_eq!(settings.capacity, 1024);
        assert_eq!(settings.expiration_window, Duration::from_secs(900));
        assert!(settings.use_sliding_expiration);
        assert_eq!(settings.polling_interval, Duration::from_secs(60));
    }

    #[test]
    fn builder_methods_replace_single_values() {
        let settings = CacheSettings::new()
            .with_capacity(7)
            .with_polling_interval(Duration::from_millis(250));

        assert_eq!(settings.capacity, 7);
        assert_eq!(settings.polling_interval, Duration::from_millis(250));

        // Untouched values keep their defaults...
        assert_eq!(settings.expiration_window, DEFAULT_EXPIRATION_WINDOW);
        assert!(settings.use_sliding_expiration);
    }
}
