//! Provides a string key which ignores ASCII case.
//!
//! The cache compares keys via their `Eq` and `Hash` implementations. For the
//! common requirement of case-insensitive string keys it is therefore enough to
//! wrap the keys in [CaselessKey], which folds ASCII letters to their lowercase
//! form for all comparisons while preserving the original spelling for display
//! purposes.
use std::fmt;
use std::hash::{Hash, Hasher};

/// A string key which hashes and compares independently of ASCII case.
///
/// # Example
/// ```
/// # use larder::{CacheSettings, CaselessKey, TtlCache};
/// # use std::time::Duration;
/// let cache: TtlCache<CaselessKey, i32> =
///     TtlCache::new(CacheSettings::new().with_polling_interval(Duration::ZERO));
///
/// cache.put(CaselessKey::new("Config"), 1).unwrap();
/// assert_eq!(cache.get(&CaselessKey::new("CONFIG")).unwrap(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct CaselessKey(String);

impl CaselessKey {
    /// Wraps the given string.
    pub fn new<S: Into<String>>(key: S) -> Self {
        CaselessKey(key.into())
    }

    /// Returns the key in its original spelling.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for CaselessKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for CaselessKey {}

impl Hash for CaselessKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Feed the folded bytes so that the hash matches the equality above...
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl From<&str> for CaselessKey {
    fn from(key: &str) -> Self {
        CaselessKey::new(key)
    }
}

impl From<String> for CaselessKey {
    fn from(key: String) -> Self {
        CaselessKey(key)
    }
}

impl fmt::Display for CaselessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashMap;

    fn hash_of(key: &CaselessKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn keys_compare_independently_of_case() {
        assert_eq!(CaselessKey::new("Hello"), CaselessKey::new("hELLO"));
        assert_ne!(CaselessKey::new("Hello"), CaselessKey::new("World"));
    }

    #[test]
    fn equal_keys_share_a_hash() {
        assert_eq!(
            hash_of(&CaselessKey::new("Hello")),
            hash_of(&CaselessKey::new("HELLO"))
        );
    }

    #[test]
    fn keys_work_as_map_keys() {
        let mut map = HashMap::new();
        let _ = map.insert(CaselessKey::new("Config"), 42);

        assert_eq!(map.get(&CaselessKey::new("CONFIG")), Some(&42));
        assert_eq!(map.get(&CaselessKey::new("Missing")), None);
    }

    #[test]
    fn original_spelling_is_preserved() {
        let key = CaselessKey::new("MixedCase");

        assert_eq!(key.as_str(), "MixedCase");
        assert_eq!(format!("{}", key), "MixedCase");
    }
}
