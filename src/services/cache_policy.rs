//! Cache categories, TTL policy and key derivation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Display;
use std::time::Duration;

/// Keys longer than this collapse to a content hash.
pub const MAX_KEY_LENGTH: usize = 200;

/// Kind of artifact being cached. Each kind has its own TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheCategory {
    CurrentPrice,
    HistoricalPrices,
    CompanyInfo,
    Indicators,
    News,
    Dividends,
    Default,
}

impl CacheCategory {
    pub const ALL: [CacheCategory; 7] = [
        CacheCategory::CurrentPrice,
        CacheCategory::HistoricalPrices,
        CacheCategory::CompanyInfo,
        CacheCategory::Indicators,
        CacheCategory::News,
        CacheCategory::Dividends,
        CacheCategory::Default,
    ];

    /// Built-in TTL in seconds.
    pub fn ttl_secs(&self) -> u64 {
        match self {
            CacheCategory::CurrentPrice => 60,
            CacheCategory::HistoricalPrices => 3600,
            CacheCategory::CompanyInfo => 86_400,
            CacheCategory::Indicators => 1800,
            CacheCategory::News => 900,
            CacheCategory::Dividends => 86_400,
            CacheCategory::Default => 1800,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheCategory::CurrentPrice => "current_price",
            CacheCategory::HistoricalPrices => "historical_prices",
            CacheCategory::CompanyInfo => "company_info",
            CacheCategory::Indicators => "indicators",
            CacheCategory::News => "news",
            CacheCategory::Dividends => "dividends",
            CacheCategory::Default => "default",
        }
    }
}

/// Resolves the TTL of a category.
///
/// The default category may be overridden from configuration; the others
/// follow the built-in table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    default_ttl: Duration,
}

impl TtlPolicy {
    pub fn new(default_ttl: Duration) -> Self {
        Self { default_ttl }
    }

    pub fn ttl(&self, category: CacheCategory) -> Duration {
        match category {
            CacheCategory::Default => self.default_ttl,
            other => Duration::from_secs(other.ttl_secs()),
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(CacheCategory::Default.ttl_secs()))
    }
}

/// Deterministic key for an operation and its ordered arguments.
///
/// Produces `operation:arg1:arg2...`; keys longer than [`MAX_KEY_LENGTH`]
/// become `operation:hash:<sha256 hex>` of the full key.
pub fn cache_key<A: Display>(operation: &str, args: &[A]) -> String {
    let mut key = operation.to_string();
    for arg in args {
        key.push(':');
        key.push_str(&arg.to_string());
    }

    if key.len() > MAX_KEY_LENGTH {
        let digest = Sha256::digest(key.as_bytes());
        format!("{}:hash:{}", operation, hex::encode(digest))
    } else {
        key
    }
}
