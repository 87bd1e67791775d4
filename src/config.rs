use crate::sources::HttpSettings;
use crate::types::Period;
use std::env;
use std::time::Duration;

/// Application configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dashboard bind address.
    pub host: String,
    /// Dashboard port.
    pub port: u16,
    /// SQLite database file.
    pub database_path: String,
    /// Redis URL for the shared cache. Unset means in-process cache only.
    pub redis_url: Option<String>,
    /// Master switch for the cache layer.
    pub cache_enabled: bool,
    /// TTL of the default cache category.
    pub cache_default_ttl: Duration,
    pub alpha_vantage_api_key: Option<String>,
    pub finnhub_api_key: Option<String>,
    pub news_api_key: Option<String>,
    /// Provider endpoint overrides, for proxies and local fixtures.
    pub endpoints: ProviderEndpoints,
    /// Symbol analyzed when none is given.
    pub default_symbol: String,
    /// Period analyzed when none is given.
    pub default_period: Period,
    /// Suffix appended to bare exchange tickers.
    pub exchange_suffix: String,
    /// Provider request timeout.
    pub http_timeout: Duration,
    /// Retries per provider request after the first attempt.
    pub http_max_retries: u32,
    /// Trend, support/resistance and volatility projections.
    pub predictive_analysis: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8501),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "stockwatch.db".to_string()),
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
            cache_enabled: env::var("CACHE_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            cache_default_ttl: Duration::from_secs(
                env::var("CACHE_DEFAULT_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1800),
            ),
            alpha_vantage_api_key: api_key("ALPHA_VANTAGE_API_KEY"),
            finnhub_api_key: api_key("FINNHUB_API_KEY"),
            news_api_key: api_key("NEWS_API_KEY"),
            endpoints: ProviderEndpoints::from_env(),
            default_symbol: env::var("DEFAULT_SYMBOL").unwrap_or_else(|_| "AFI".to_string()),
            default_period: env::var("DEFAULT_PERIOD")
                .ok()
                .and_then(|v| Period::parse(&v))
                .unwrap_or_default(),
            exchange_suffix: env::var("EXCHANGE_SUFFIX").unwrap_or_else(|_| ".AX".to_string()),
            http_timeout: Duration::from_secs(
                env::var("HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
            http_max_retries: env::var("HTTP_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            predictive_analysis: env::var("PREDICTIVE_ANALYSIS")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: self.http_timeout,
            max_retries: self.http_max_retries,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            database_path: "stockwatch.db".to_string(),
            redis_url: None,
            cache_enabled: true,
            cache_default_ttl: Duration::from_secs(1800),
            alpha_vantage_api_key: None,
            finnhub_api_key: None,
            news_api_key: None,
            endpoints: ProviderEndpoints::default(),
            default_symbol: "AFI".to_string(),
            default_period: Period::default(),
            exchange_suffix: ".AX".to_string(),
            http_timeout: Duration::from_secs(30),
            http_max_retries: 3,
            predictive_analysis: true,
        }
    }
}

/// Base URLs that replace the public provider endpoints when set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub yahoo: Option<String>,
    pub alpha_vantage: Option<String>,
    pub finnhub: Option<String>,
    pub news_api: Option<String>,
}

impl ProviderEndpoints {
    fn from_env() -> Self {
        let url = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            yahoo: url("YAHOO_BASE_URL"),
            alpha_vantage: url("ALPHA_VANTAGE_BASE_URL"),
            finnhub: url("FINNHUB_BASE_URL"),
            news_api: url("NEWS_API_BASE_URL"),
        }
    }
}

/// Empty or placeholder keys count as absent.
fn api_key(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.starts_with("your_"))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Which optional features this run can use.
///
/// Resolved once at startup from the configuration and passed to whoever
/// needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Always available; the chart endpoint needs no key.
    pub yahoo: bool,
    pub alpha_vantage: bool,
    pub finnhub: bool,
    pub news_api: bool,
    pub cache: bool,
    pub redis: bool,
    pub predictive: bool,
}

impl Capabilities {
    pub fn resolve(config: &Config) -> Self {
        Self {
            yahoo: true,
            alpha_vantage: config.alpha_vantage_api_key.is_some(),
            finnhub: config.finnhub_api_key.is_some(),
            news_api: config.news_api_key.is_some(),
            cache: config.cache_enabled,
            redis: config.cache_enabled && config.redis_url.is_some(),
            predictive: config.predictive_analysis,
        }
    }

    /// True if any news provider is configured.
    pub fn news(&self) -> bool {
        self.finnhub || self.news_api
    }

    /// Name and availability of each feature, for display.
    pub fn table(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("Yahoo Finance", self.yahoo),
            ("Alpha Vantage", self.alpha_vantage),
            ("Finnhub", self.finnhub),
            ("NewsAPI", self.news_api),
            ("Cache", self.cache),
            ("Redis", self.redis),
            ("Predictive analytics", self.predictive),
        ]
    }
}
