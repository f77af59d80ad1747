//! Defines the error type reported by all fallible cache operations.
//!
//! Every foreground operation of the cache reports its failure as a distinct
//! [CacheError] value so that callers can react programmatically (e.g. treat
//! [CacheError::NotFound] as a plain cache miss while treating
//! [CacheError::Disposed] as a programming error). The background reaper never
//! surfaces errors to callers, it simply terminates.
use thiserror::Error;

/// Enumerates the errors reported by the cache facade.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// There is no live entry for the requested key.
    ///
    /// This is reported if the key is either completely unknown or if its entry
    /// has passed its expiry and is therefore treated as absent.
    #[error("no live entry exists for the given key")]
    NotFound,

    /// An argument was outside of its permitted range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A destination buffer was too small to receive a snapshot of the cache.
    #[error("the destination can take {available} entries but {needed} are required")]
    InsufficientCapacity {
        /// The number of entries which would have to be copied.
        needed: usize,
        /// The number of slots remaining in the destination.
        available: usize,
    },

    /// The cache has been disposed and can no longer be used.
    #[error("the cache has already been disposed")]
    Disposed,
}

/// Convenience result type used by all cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_a_helpful_message() {
        assert_eq!(
            CacheError::NotFound.to_string(),
            "no live entry exists for the given key"
        );
        assert_eq!(
            CacheError::InvalidArgument("offset exceeds the destination length").to_string(),
            "invalid argument: offset exceeds the destination length"
        );
        assert_eq!(
            CacheError::InsufficientCapacity {
                needed: 4,
                available: 2
            }
            .to_string(),
            "the destination can take 2 entries but 4 are required"
        );
        assert_eq!(
            CacheError::Disposed.to_string(),
            "the cache has already been disposed"
        );
    }

    #[test]
    fn errors_support_comparisons() {
        assert_eq!(CacheError::NotFound, CacheError::NotFound);
        assert_ne!(CacheError::NotFound, CacheError::Disposed);
    }
}
