//! Read-through cache used by every data-source call.
//!
//! Values are stored as JSON under keys built by
//! [`cache_key`](super::cache_policy::cache_key). Redis is preferred; when it
//! is unreachable the service falls back to an in-process [`TtlCache`].
//! Backend failures are never surfaced to callers, they count as misses.

use super::cache::TtlCache;
use super::cache_policy::{CacheCategory, TtlPolicy};
use super::redis_store::{RedisInfo, RedisStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

enum Backend {
    Redis(RedisStore),
    Memory(TtlCache<String>),
    Disabled,
}

impl Backend {
    fn name(&self) -> &'static str {
        match self {
            Backend::Redis(_) => "redis",
            Backend::Memory(_) => "memory",
            Backend::Disabled => "disabled",
        }
    }
}

/// Snapshot of cache health and counters.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub enabled: bool,
    pub backend: String,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub hit_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<RedisInfo>,
}

pub struct CacheService {
    backend: Backend,
    policy: TtlPolicy,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl CacheService {
    /// Connect to Redis, falling back to the in-process cache when the
    /// server cannot be reached.
    pub async fn connect(redis_url: &str, default_ttl: Duration) -> Self {
        let store = RedisStore::new(redis_url).await;
        if store.is_connected().await {
            Self::with_backend(Backend::Redis(store), default_ttl)
        } else {
            info!("Cache using in-process memory backend");
            Self::memory(default_ttl)
        }
    }

    /// In-process cache only.
    pub fn memory(default_ttl: Duration) -> Self {
        Self::with_backend(Backend::Memory(TtlCache::new(default_ttl)), default_ttl)
    }

    /// A cache that never stores anything; every lookup misses.
    pub fn disabled() -> Self {
        Self::with_backend(
            Backend::Disabled,
            Duration::from_secs(CacheCategory::Default.ttl_secs()),
        )
    }

    fn with_backend(backend: Backend, default_ttl: Duration) -> Self {
        Self {
            backend,
            policy: TtlPolicy::new(default_ttl),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.backend, Backend::Disabled)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn ttl(&self, category: CacheCategory) -> Duration {
        self.policy.ttl(category)
    }

    async fn get_raw(&self, key: &str) -> Option<String> {
        match &self.backend {
            Backend::Redis(store) => store.get(key).await,
            Backend::Memory(cache) => cache.get(key),
            Backend::Disabled => None,
        }
    }

    /// Look up a value. Decode failures count as misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key).await;
        let value = raw.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                None
            }
        });

        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit: {}", key);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("Cache miss: {}", key);
        }
        value
    }

    /// Store a value with the TTL of its category. Returns whether the
    /// backend accepted the write.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, category: CacheCategory) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to encode cache entry {}: {}", key, e);
                return false;
            }
        };
        let ttl = self.policy.ttl(category);

        let stored = match &self.backend {
            Backend::Redis(store) => store.set_ex(key, &raw, ttl.as_secs().max(1)).await,
            Backend::Memory(cache) => {
                cache.set_with_ttl(key.to_string(), raw, ttl);
                true
            }
            Backend::Disabled => false,
        };

        if stored {
            self.writes.fetch_add(1, Ordering::Relaxed);
        }
        stored
    }

    /// Remove a single key. Returns true if it existed.
    pub async fn delete(&self, key: &str) -> bool {
        match &self.backend {
            Backend::Redis(store) => store.delete(key).await,
            Backend::Memory(cache) => cache.remove(key).is_some(),
            Backend::Disabled => false,
        }
    }

    /// Remove every key matching a `*` wildcard pattern.
    pub async fn clear_pattern(&self, pattern: &str) -> usize {
        let removed = match &self.backend {
            Backend::Redis(store) => store.delete_matching(pattern).await,
            Backend::Memory(cache) => cache.remove_matching(pattern),
            Backend::Disabled => 0,
        };
        info!("Cleared {} cache entries matching {}", removed, pattern);
        removed
    }

    /// Remove every key starting with `prefix`.
    pub async fn clear_prefix(&self, prefix: &str) -> usize {
        self.clear_pattern(&format!("{}*", prefix)).await
    }

    /// Remove every entry whose key mentions `symbol`.
    pub async fn clear_symbol(&self, symbol: &str) -> usize {
        self.clear_pattern(&format!("*:{}*", symbol)).await
    }

    /// Remove everything.
    pub async fn clear_all(&self) -> usize {
        self.clear_pattern("*").await
    }

    pub async fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        let (entries, redis) = match &self.backend {
            Backend::Redis(store) => (store.key_count().await, store.info().await),
            Backend::Memory(cache) => {
                cache.cleanup();
                (Some(cache.len()), None)
            }
            Backend::Disabled => (None, None),
        };

        CacheStats {
            enabled: self.is_enabled(),
            backend: self.backend.name().to_string(),
            hits,
            misses,
            writes: self.writes.load(Ordering::Relaxed),
            hit_rate: if lookups > 0 {
                hits as f64 / lookups as f64 * 100.0
            } else {
                0.0
            },
            entries,
            redis,
        }
    }

    /// Return the cached value or compute, store and return a fresh one.
    /// `None` results are not cached.
    pub async fn read_through<T, F, Fut>(
        &self,
        key: &str,
        category: CacheCategory,
        fetch: F,
    ) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        if let Some(cached) = self.get(key).await {
            return Some(cached);
        }
        let fresh = fetch().await?;
        self.set(key, &fresh, category).await;
        Some(fresh)
    }

    /// Like [`read_through`](Self::read_through) for fallible fetches.
    /// Errors propagate and are not cached.
    pub async fn try_read_through<T, E, F, Fut>(
        &self,
        key: &str,
        category: CacheCategory,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get(key).await {
            return Ok(cached);
        }
        let fresh = fetch().await?;
        self.set(key, &fresh, category).await;
        Ok(fresh)
    }
}
