//! Larder is a thread-safe, in-memory key/value cache with per-entry expiration,
//! bounded capacity and a cooperative background reaper.
//!
//! # Introduction
//! Many services keep semi-constant data around which is expensive to compute or
//! fetch (think of session metadata, directory lookups or the results of remote
//! calls). Keeping such data in a plain map quickly turns into a liability: the
//! map grows without bounds and happily serves data which has long become stale.
//!
//! **Larder** provides a map-like facade which solves both problems at once. Every
//! entry carries an absolute expiration timestamp and is reported as absent once
//! that timestamp has passed. The cache is also limited to a maximal number of
//! entries. If that limit is reached, the entry which is closest to its expiry
//! (with ties broken by least recent and then least frequent use) is evicted to
//! make room.
//!
//! Stale entries which are never touched again wouldn't be observed and would
//! therefore linger in memory. To prevent this, an optional background task (the
//! *reaper*) periodically removes all entries which have passed their expiry. The
//! reaper is fully cooperative: it is only active while the cache contains data,
//! shuts itself down once the cache runs empty and is re-armed by the next
//! insert.
//!
//! # Features
//! * **Map-like API**: [put](cache::TtlCache::put), [get](cache::TtlCache::get),
//!   [remove](cache::TtlCache::remove), [contains_key](cache::TtlCache::contains_key)
//!   and friends, guarded by a single internal lock so that the cache can be
//!   shared freely between threads.
//! * **Per-entry expiration** with an optional *sliding* mode in which every
//!   successful read pushes the expiry of the entry further into the future.
//! * **Use-aware eviction**: when the capacity is exhausted, the entry with the
//!   earliest expiry is discarded first. This converges towards a TTL-aware
//!   eviction under hot workloads instead of a plain LRU.
//! * **Cooperative reaper** built on [tokio](https://tokio.rs/) which sweeps
//!   expired entries in the background and follows the occupancy of the cache.
//! * **Usage metrics**: reads, writes, hits, evictions and expirations are
//!   recorded and can be inspected at any time.
//!
//! # Example
//! ```
//! # use larder::{CacheSettings, TtlCache};
//! # #[tokio::main]
//! # async fn main() {
//! let cache = TtlCache::new(CacheSettings::new());
//!
//! cache.put("answer", 42).unwrap();
//! assert_eq!(cache.get(&"answer").unwrap(), 42);
//!
//! assert_eq!(cache.remove(&"answer").unwrap(), true);
//! assert_eq!(cache.try_get(&"answer").unwrap(), None);
//! # }
//! ```
//!
//! # Modules
//! * **cache**: The cache facade itself along with its settings and the
//!   case-insensitive key helper. See [cache::TtlCache].
//! * **error**: The error type reported by all fallible cache operations. See
//!   [error::CacheError].
#![deny(
    warnings,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_results
)]
use simplelog::{format_description, ConfigBuilder, LevelFilter, SimpleLogger};
use std::sync::Once;

pub mod cache;
pub mod error;

pub use cache::{CacheSettings, CaselessKey, TtlCache};
pub use error::{CacheError, Result};

/// Initializes the logging system.
///
/// This installs a simple console logger so that the log output of the cache
/// (most notably the debug output of the background reaper) becomes visible.
/// Applications which bring their own logging backend can simply skip this call.
pub fn init_logging() {
    static INIT_LOGGING: Once = Once::new();

    // We need to do this as otherwise the integration tests might crash as the logging system
    // is initialized several times...
    INIT_LOGGING.call_once(|| {
        if let Err(error) = SimpleLogger::init(
            LevelFilter::Debug,
            ConfigBuilder::new()
                .set_time_format_custom(format_description!(
                    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]"
                ))
                .set_thread_level(LevelFilter::Trace)
                .set_target_level(LevelFilter::Error)
                .set_location_level(LevelFilter::Trace)
                .build(),
        ) {
            panic!("Failed to initialize logging system: {}", error);
        }
    });
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    lazy_static::lazy_static! {
        /// Provides a global lock which has to be acquired by every test which
        /// manipulates the mock clock. The clock is a process wide resource,
        /// therefore tests which advance it must not run in parallel with each
        /// other. All other tests remain unaffected and still run concurrently.
        pub static ref SHARED_TEST_RESOURCES: Mutex<()> = Mutex::new(());
    }
}
