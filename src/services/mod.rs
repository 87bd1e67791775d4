pub mod analytics;
pub mod cache;
pub mod cache_policy;
pub mod cache_service;
pub mod redis_store;
pub mod sentiment;
pub mod signals;
pub mod sqlite_store;
pub mod tracker;

pub use cache::TtlCache;
pub use cache_policy::{cache_key, CacheCategory, TtlPolicy};
pub use cache_service::{CacheService, CacheStats};
pub use redis_store::{RedisInfo, RedisStore};
pub use signals::{IndicatorSet, MAX_PATTERN_SCAN};
pub use sqlite_store::{DatabaseStats, PriceStatistics, SqliteStore};
pub use tracker::{MarketData, StockTracker};
