use dashmap::DashMap;
use std::time::{Duration, Instant};

/// A thread-safe in-process cache with per-entry TTL.
///
/// Expired entries are never returned. They are dropped lazily on access
/// or in bulk by [`TtlCache::cleanup`].
pub struct TtlCache<V> {
    data: DashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V: Clone> TtlCache<V> {
    /// Create a new cache with the given default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            data: DashMap::new(),
            default_ttl,
        }
    }

    /// Get a value from the cache.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.data.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.data.remove(key);
            None
        }
    }

    /// Set a value in the cache with the default TTL.
    pub fn set(&self, key: String, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Set a value in the cache with a custom TTL.
    pub fn set_with_ttl(&self, key: String, value: V, ttl: Duration) {
        self.data.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Check if a key exists and is not expired.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove a value from the cache. An expired entry is dropped but not
    /// returned.
    pub fn remove(&self, key: &str) -> Option<V> {
        let (_, entry) = self.data.remove(key)?;
        (entry.expires_at > Instant::now()).then_some(entry.value)
    }

    /// Remove every entry whose key matches a `*` wildcard pattern.
    /// Returns the number of live entries removed.
    pub fn remove_matching(&self, pattern: &str) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.data.retain(|key, entry| {
            if wildcard_match(pattern, key) {
                if entry.expires_at > now {
                    removed += 1;
                }
                false
            } else {
                true
            }
        });
        removed
    }

    /// Clear all entries from the cache.
    pub fn clear(&self) {
        self.data.clear();
    }

    /// Remove all expired entries from the cache.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.data.retain(|_, entry| entry.expires_at > now);
    }

    /// Get the number of entries in the cache (including expired).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Match `text` against a pattern where `*` matches any run of characters.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume = 0;

    while ti < t.len() {
        if pi < p.len() && p[pi] != '*' && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            pi += 1;
            resume = ti;
        } else if let Some(s) = star {
            pi = s + 1;
            resume += 1;
            ti = resume;
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotes() -> TtlCache<String> {
        TtlCache::new(Duration::from_secs(60))
    }

    #[test]
    fn test_hit_and_miss() {
        let cache = quotes();
        cache.set("quote:AFI.AX".to_string(), "7.15".to_string());
        assert_eq!(cache.get("quote:AFI.AX").as_deref(), Some("7.15"));
        assert!(cache.get("quote:CBA.AX").is_none());
    }

    #[test]
    fn test_default_ttl_expires() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.set("quote:AFI.AX".to_string(), 7.15);
        std::thread::sleep(Duration::from_millis(25));
        assert!(cache.get("quote:AFI.AX").is_none());
        // expired entries are dropped on access
        assert!(cache.is_empty());
    }

    #[test]
    fn test_per_entry_ttl() {
        let cache = quotes();
        cache.set_with_ttl("quote:AFI.AX".to_string(), "7.15".to_string(), Duration::from_millis(10));
        cache.set_with_ttl("company:AFI.AX".to_string(), "AFIC".to_string(), Duration::from_secs(86_400));
        std::thread::sleep(Duration::from_millis(25));

        assert!(!cache.contains("quote:AFI.AX"));
        assert!(cache.contains("company:AFI.AX"));
    }

    #[test]
    fn test_remove() {
        let cache = quotes();
        cache.set("news:AFI.AX:7".to_string(), "[]".to_string());
        assert_eq!(cache.remove("news:AFI.AX:7").as_deref(), Some("[]"));
        assert!(cache.remove("news:AFI.AX:7").is_none());
    }

    #[test]
    fn test_remove_expired_entry() {
        let cache = quotes();
        cache.set_with_ttl("quote:AFI.AX".to_string(), "7.15".to_string(), Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(25));

        assert!(cache.remove("quote:AFI.AX").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_matching_counts_live_entries() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("history:AFI.AX:1y".to_string(), 1);
        cache.set("company:AFI.AX".to_string(), 2);
        cache.set("history:CBA.AX:1y".to_string(), 3);
        cache.set_with_ttl("quote:AFI.AX".to_string(), 4, Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(15));

        assert_eq!(cache.remove_matching("*:AFI.AX*"), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("history:CBA.AX:1y"), Some(3));
    }

    #[test]
    fn test_cleanup_and_clear() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.set("quote:AFI.AX".to_string(), 1);
        cache.set_with_ttl("dividends:AFI.AX".to_string(), 2, Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(25));

        assert_eq!(cache.len(), 2);
        cache.cleanup();
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    // =========================================================================
    // wildcard_match
    // =========================================================================

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("history:*", "history:AFI.AX:1y"));
        assert!(wildcard_match("*", ""));
        assert!(wildcard_match("*:AFI.AX*", "company:AFI.AX"));
        assert!(wildcard_match("news:*:7", "news:CBA.AX:7"));
        assert!(!wildcard_match("history:*", "company:AFI.AX"));
        assert!(!wildcard_match("quote:AFI", "quote:AFI.AX"));
        assert!(wildcard_match("quote:AFI.AX", "quote:AFI.AX"));
    }
}
