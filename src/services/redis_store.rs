use redis::{aio::ConnectionManager, AsyncCommands, RedisResult};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Namespace for every key this application writes.
const KEY_PREFIX: &str = "stockwatch:cache:";

/// Keys requested per SCAN round trip.
const SCAN_BATCH: usize = 200;

/// Server statistics reported by `INFO`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedisInfo {
    pub connected_clients: Option<u64>,
    pub used_memory_human: Option<String>,
    pub keyspace_hits: Option<u64>,
    pub keyspace_misses: Option<u64>,
    pub expired_keys: Option<u64>,
    pub evicted_keys: Option<u64>,
}

impl RedisInfo {
    /// Parse the `key:value` lines of an `INFO` reply.
    pub fn parse(info: &str) -> Self {
        let mut parsed = RedisInfo::default();
        for line in info.lines() {
            let Some((key, value)) = line.trim().split_once(':') else {
                continue;
            };
            match key {
                "connected_clients" => parsed.connected_clients = value.parse().ok(),
                "used_memory_human" => parsed.used_memory_human = Some(value.to_string()),
                "keyspace_hits" => parsed.keyspace_hits = value.parse().ok(),
                "keyspace_misses" => parsed.keyspace_misses = value.parse().ok(),
                "expired_keys" => parsed.expired_keys = value.parse().ok(),
                "evicted_keys" => parsed.evicted_keys = value.parse().ok(),
                _ => {}
            }
        }
        parsed
    }
}

/// Redis-backed string store with per-key expiry.
///
/// Every operation degrades to a no-op or a miss when the server is
/// unreachable.
#[derive(Clone)]
pub struct RedisStore {
    conn: Arc<RwLock<Option<ConnectionManager>>>,
}

impl RedisStore {
    /// Create a new RedisStore, connecting to Redis at the given URL.
    pub async fn new(redis_url: &str) -> Self {
        let conn = match Self::connect(redis_url).await {
            Ok(c) => {
                info!("Connected to Redis at {}", redis_url);
                Some(c)
            }
            Err(e) => {
                warn!("Failed to connect to Redis: {}. Using in-process cache.", e);
                None
            }
        };

        Self {
            conn: Arc::new(RwLock::new(conn)),
        }
    }

    async fn connect(redis_url: &str) -> RedisResult<ConnectionManager> {
        let client = redis::Client::open(redis_url)?;
        ConnectionManager::new(client).await
    }

    /// Check if Redis is connected.
    pub async fn is_connected(&self) -> bool {
        self.conn.read().await.is_some()
    }

    fn full_key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }

    /// Get a raw value.
    pub async fn get(&self, key: &str) -> Option<String> {
        let conn_guard = self.conn.read().await;
        let mut conn = conn_guard.as_ref()?.clone();

        let value: RedisResult<Option<String>> = conn.get(Self::full_key(key)).await;
        match value {
            Ok(value) => value,
            Err(e) => {
                warn!("Redis GET {} failed: {}", key, e);
                None
            }
        }
    }

    /// Store a raw value with an expiry in seconds.
    pub async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        let conn_guard = self.conn.read().await;
        let Some(ref conn) = *conn_guard else {
            return false;
        };

        let mut conn = conn.clone();
        match conn
            .set_ex::<_, _, ()>(Self::full_key(key), value, ttl_secs)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Redis SETEX {} failed: {}", key, e);
                false
            }
        }
    }

    /// Delete a key. Returns true if it existed.
    pub async fn delete(&self, key: &str) -> bool {
        let conn_guard = self.conn.read().await;
        let Some(ref conn) = *conn_guard else {
            return false;
        };

        let mut conn = conn.clone();
        match redis::cmd("DEL")
            .arg(Self::full_key(key))
            .query_async::<_, i64>(&mut conn)
            .await
        {
            Ok(n) => n > 0,
            Err(e) => {
                warn!("Redis DEL {} failed: {}", key, e);
                false
            }
        }
    }

    /// Collect every namespaced key matching a glob pattern with SCAN.
    async fn scan_keys(conn: &mut ConnectionManager, pattern: &str) -> RedisResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(Self::full_key(pattern))
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                return Ok(keys);
            }
            cursor = next;
        }
    }

    /// Delete every key matching a glob pattern. Returns the number removed.
    pub async fn delete_matching(&self, pattern: &str) -> usize {
        let conn_guard = self.conn.read().await;
        let Some(ref conn) = *conn_guard else {
            return 0;
        };

        let mut conn = conn.clone();
        let keys = match Self::scan_keys(&mut conn, pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Redis SCAN {} failed: {}", pattern, e);
                return 0;
            }
        };

        if keys.is_empty() {
            return 0;
        }

        match redis::cmd("DEL")
            .arg(&keys)
            .query_async::<_, i64>(&mut conn)
            .await
        {
            Ok(n) => {
                debug!("Deleted {} Redis keys matching {}", n, pattern);
                n.max(0) as usize
            }
            Err(e) => {
                warn!("Redis DEL for {} failed: {}", pattern, e);
                0
            }
        }
    }

    /// Number of keys in this application's namespace.
    pub async fn key_count(&self) -> Option<usize> {
        let conn_guard = self.conn.read().await;
        let mut conn = conn_guard.as_ref()?.clone();

        Self::scan_keys(&mut conn, "*").await.map(|keys| keys.len()).ok()
    }

    /// Server statistics.
    pub async fn info(&self) -> Option<RedisInfo> {
        let conn_guard = self.conn.read().await;
        let mut conn = conn_guard.as_ref()?.clone();

        match redis::cmd("INFO").query_async::<_, String>(&mut conn).await {
            Ok(info) => Some(RedisInfo::parse(&info)),
            Err(e) => {
                debug!("Redis INFO failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_key_is_namespaced() {
        assert_eq!(
            RedisStore::full_key("history:AFI.AX:1y"),
            "stockwatch:cache:history:AFI.AX:1y"
        );
    }

    #[test]
    fn test_parse_info() {
        let info = "# Clients\r\nconnected_clients:3\r\n# Memory\r\nused_memory_human:1.04M\r\n\
                    # Stats\r\nkeyspace_hits:120\r\nkeyspace_misses:30\r\nexpired_keys:7\r\nevicted_keys:0\r\n";
        let parsed = RedisInfo::parse(info);
        assert_eq!(parsed.connected_clients, Some(3));
        assert_eq!(parsed.used_memory_human.as_deref(), Some("1.04M"));
        assert_eq!(parsed.keyspace_hits, Some(120));
        assert_eq!(parsed.keyspace_misses, Some(30));
        assert_eq!(parsed.expired_keys, Some(7));
        assert_eq!(parsed.evicted_keys, Some(0));
    }

    #[test]
    fn test_parse_info_ignores_garbage() {
        let parsed = RedisInfo::parse("not info\nconnected_clients:abc\n");
        assert_eq!(parsed, RedisInfo::default());
    }

    #[tokio::test]
    async fn test_unreachable_server_degrades() {
        let store = RedisStore::new("redis://127.0.0.1:1").await;
        assert!(!store.is_connected().await);
        assert_eq!(store.get("missing").await, None);
        assert!(!store.set_ex("key", "value", 60).await);
        assert!(!store.delete("key").await);
        assert_eq!(store.delete_matching("*").await, 0);
        assert!(store.info().await.is_none());
    }
}
