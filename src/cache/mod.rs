//! Provides an expiring cache with bounded capacity.
//!
//! A [TtlCache] behaves just like a **Map** with two additional twists. First,
//! every entry expires after a configurable window and is reported as absent
//! once that window has passed. Second, the number of entries is limited. If
//! the limit is reached, the entry closest to its expiry is evicted to make
//! room for the newcomer.
//!
//! Expired entries which are never observed again are removed by a cooperative
//! background task, the *reaper*, which is armed while the cache holds data and
//! stands down once it runs empty. [TtlCache::is_polling] tells whether the
//! reaper of a cache is currently active.
//!
//! All behavior is controlled via [CacheSettings] which is handed to the cache
//! on construction. [CaselessKey] is provided for callers which want their
//! string keys compared independently of ASCII case.
mod entry;
pub mod key;
mod reaper;
mod settings;
mod ttl_cache;

pub use key::CaselessKey;
pub use settings::CacheSettings;
pub use settings::{
    DEFAULT_CAPACITY, DEFAULT_EXPIRATION_WINDOW, DEFAULT_POLLING_INTERVAL, MIN_EXPIRATION_WINDOW,
};
pub use ttl_cache::TtlCache;
