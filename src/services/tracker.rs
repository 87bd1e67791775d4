//! Stock tracker orchestration.
//!
//! Fetches one symbol's market data from the providers through the cache,
//! runs the indicator, pattern and analytics passes over it and writes the
//! results through to SQLite.

use crate::config::{Capabilities, Config};
use crate::error::{AppError, Result};
use crate::services::analytics::{
    dividend_metrics, predict_trend, return_metrics, support_resistance, volatility_forecast,
};
use crate::services::cache_policy::{cache_key, CacheCategory};
use crate::services::signals::{detect_patterns, IndicatorSet, MAX_PATTERN_SCAN};
use crate::services::{sentiment, CacheService, SqliteStore};
use crate::sources::{
    AlphaVantageClient, FinnhubClient, NewsApiClient, YahooFinanceClient, YahooHistory,
    YahooQuoteMeta,
};
use crate::types::{
    closes, AnalysisReport, CompanyInfo, DividendEvent, MaPosition, MarketSentiment, NewsArticle,
    Period, PriceBar, PriceSummary, RsiZone, TechnicalSignals,
};
use chrono::{Duration, NaiveDate, Utc};
use futures_util::future::join;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Days of news requested from the providers.
pub const NEWS_LOOKBACK_DAYS: i64 = 7;

/// Maximum articles kept per symbol.
pub const MAX_ARTICLES: usize = 50;

/// Trading days projected by the trend forecast.
pub const FORECAST_DAYS: usize = 30;

/// Neighbourhood half-width for support and resistance levels.
pub const LEVEL_WINDOW: usize = 20;

/// Rolling window for the volatility forecast.
pub const VOLATILITY_WINDOW: usize = 30;

/// Bars of indicator values written to the database per run.
const PERSISTED_INDICATOR_BARS: usize = 1;

/// Well-known ASX listings and their full names.
const KNOWN_COMPANIES: &[(&str, &str)] = &[
    ("AFI.AX", "Australian Foundation Investment Company"),
    ("CBA.AX", "Commonwealth Bank of Australia"),
    ("BHP.AX", "BHP Group Limited"),
    ("CSL.AX", "CSL Limited"),
    ("WBC.AX", "Westpac Banking Corporation"),
    ("ANZ.AX", "Australia and New Zealand Banking Group"),
    ("NAB.AX", "National Australia Bank"),
    ("TLS.AX", "Telstra Corporation"),
    ("WES.AX", "Wesfarmers Limited"),
    ("MQG.AX", "Macquarie Group"),
];

/// Everything fetched for one symbol and period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub symbol: String,
    pub period: Period,
    /// Daily bars, oldest first.
    pub bars: Vec<PriceBar>,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    /// Full dividend history, oldest first.
    pub dividends: Vec<DividendEvent>,
    pub company: Option<CompanyInfo>,
    /// Newest first.
    pub news: Vec<NewsArticle>,
    /// Providers that returned data.
    pub sources: Vec<String>,
}

/// Uppercase `raw` and append `suffix` to bare alphabetic tickers of at
/// most four characters.
pub fn normalize_symbol(raw: &str, suffix: &str) -> String {
    let symbol = raw.trim().to_uppercase();
    if suffix.is_empty() || symbol.ends_with(&suffix.to_uppercase()) {
        return symbol;
    }
    if !symbol.is_empty() && symbol.len() <= 4 && symbol.chars().all(|c| c.is_ascii_alphabetic()) {
        format!("{}{}", symbol, suffix.to_uppercase())
    } else {
        symbol
    }
}

/// Ticker without its exchange suffix.
pub fn base_ticker(symbol: &str) -> &str {
    symbol.split('.').next().unwrap_or(symbol)
}

/// Full company name for well-known tickers.
pub fn company_name(symbol: &str) -> Option<&'static str> {
    KNOWN_COMPANIES
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
        .map(|(_, name)| *name)
}

/// Report heading for a symbol.
pub fn display_name(symbol: &str) -> String {
    let base = base_ticker(symbol);
    match company_name(symbol) {
        Some(name) => format!("{} ({})", name, base),
        None => format!("{} Stock Analysis", base),
    }
}

/// Deduplicate by URL, sort newest first and cap at [`MAX_ARTICLES`].
pub fn merge_articles(articles: Vec<NewsArticle>) -> Vec<NewsArticle> {
    let mut merged: Vec<NewsArticle> = Vec::with_capacity(articles.len());
    for article in articles {
        if !merged.iter().any(|a| a.url == article.url) {
            merged.push(article);
        }
    }
    merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    merged.truncate(MAX_ARTICLES);
    merged
}

fn company_from_quote(symbol: &str, meta: &YahooQuoteMeta) -> CompanyInfo {
    CompanyInfo {
        name: meta.name.clone(),
        currency: meta.currency.clone(),
        exchange: meta.exchange.clone(),
        week_52_high: meta.week_52_high,
        week_52_low: meta.week_52_low,
        ..CompanyInfo::new(symbol)
    }
}

/// Headline price figures from the bars and the live quote.
fn price_summary(data: &MarketData, last: &PriceBar) -> PriceSummary {
    let current_price = data.current_price.unwrap_or(last.close);
    let previous_close = data.previous_close.or_else(|| {
        data.bars
            .len()
            .checked_sub(2)
            .and_then(|i| data.bars.get(i))
            .map(|b| b.close)
    });
    let change = previous_close.map(|prev| current_price - prev);
    let change_pct = previous_close
        .filter(|prev| *prev != 0.0)
        .map(|prev| (current_price - prev) / prev * 100.0);

    let year_start = last.date - Duration::days(365);
    let year = data.bars.iter().filter(|b| b.date > year_start);
    let (high_52w, low_52w) = year.fold((f64::MIN, f64::MAX), |(hi, lo), b| {
        (hi.max(b.high), lo.min(b.low))
    });

    PriceSummary {
        current_price,
        previous_close,
        change,
        change_pct,
        high_52w,
        low_52w,
        as_of: last.date,
    }
}

fn optional_client<T>(name: &str, client: std::result::Result<T, String>) -> Option<T> {
    match client {
        Ok(client) => Some(client),
        Err(e) => {
            warn!("Failed to create {} client: {}", name, e);
            None
        }
    }
}

/// Fetches, analyzes and persists market data for a symbol.
pub struct StockTracker {
    config: Config,
    capabilities: Capabilities,
    cache: Arc<CacheService>,
    store: Option<Arc<SqliteStore>>,
    yahoo: YahooFinanceClient,
    alpha_vantage: Option<AlphaVantageClient>,
    finnhub: Option<FinnhubClient>,
    news_api: Option<NewsApiClient>,
}

impl StockTracker {
    /// Build the tracker and the provider clients the capabilities allow.
    ///
    /// Only the Yahoo client is required; optional clients that fail to
    /// build are logged and left out.
    pub fn new(
        config: Config,
        capabilities: Capabilities,
        cache: Arc<CacheService>,
        store: Option<Arc<SqliteStore>>,
    ) -> Result<Self> {
        let settings = config.http_settings();
        let endpoints = &config.endpoints;

        let mut yahoo = YahooFinanceClient::new(settings).map_err(AppError::Internal)?;
        if let Some(url) = &endpoints.yahoo {
            yahoo = yahoo.with_base_url(url.as_str());
        }

        let alpha_vantage = match (&config.alpha_vantage_api_key, capabilities.alpha_vantage) {
            (Some(key), true) => optional_client(
                "Alpha Vantage",
                AlphaVantageClient::new(key.clone(), settings).map(|c| match &endpoints.alpha_vantage {
                    Some(url) => c.with_base_url(url.as_str()),
                    None => c,
                }),
            ),
            _ => None,
        };
        let finnhub = match (&config.finnhub_api_key, capabilities.finnhub) {
            (Some(key), true) => optional_client(
                "Finnhub",
                FinnhubClient::new(key.clone(), settings).map(|c| match &endpoints.finnhub {
                    Some(url) => c.with_base_url(url.as_str()),
                    None => c,
                }),
            ),
            _ => None,
        };
        let news_api = match (&config.news_api_key, capabilities.news_api) {
            (Some(key), true) => optional_client(
                "NewsAPI",
                NewsApiClient::new(key.clone(), settings).map(|c| match &endpoints.news_api {
                    Some(url) => c.with_base_url(url.as_str()),
                    None => c,
                }),
            ),
            _ => None,
        };

        Ok(Self {
            config,
            capabilities,
            cache,
            store,
            yahoo,
            alpha_vantage,
            finnhub,
            news_api,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn store(&self) -> Option<&Arc<SqliteStore>> {
        self.store.as_ref()
    }

    /// Normalize a user-supplied symbol with the configured exchange suffix.
    pub fn normalize_symbol(&self, raw: &str) -> String {
        normalize_symbol(raw, &self.config.exchange_suffix)
    }

    /// Fetch everything known about `symbol` for `period`.
    ///
    /// Provider calls run concurrently through the cache. Only a failed or
    /// empty price history is an error; every other provider is optional.
    pub async fn gather(&self, symbol: &str, period: Period) -> Result<MarketData> {
        let symbol = self.normalize_symbol(symbol);
        info!("Gathering market data for {} ({})", symbol, period);

        let history = self.fetch_history(&symbol, period);
        let quote = self.fetch_quote(&symbol);
        let company = self.fetch_company(&symbol);
        let news = self.fetch_news(&symbol);
        // The daily history already carries every dividend for `max`.
        let dividends = async {
            if period == Period::Max {
                None
            } else {
                self.fetch_dividends(&symbol).await
            }
        };
        let ((history, quote), (company, (news, dividends))) =
            join(join(history, quote), join(company, join(news, dividends))).await;

        let (history, history_source) = history?;
        if history.bars.is_empty() {
            return Err(AppError::ProviderUnavailable {
                symbol,
                reason: "No price data returned".to_string(),
            });
        }

        let dividends = dividends.unwrap_or_else(|| history.dividends.clone());

        let mut sources = vec![history_source];

        let mut merged_company = company_from_quote(&symbol, &history.meta);
        if let Some(ref quote) = quote {
            merged_company.merge(company_from_quote(&symbol, quote));
        }
        if let Some((provider_info, provider_sources)) = company {
            merged_company.merge(provider_info);
            sources.extend(provider_sources);
        }
        if merged_company.name.is_none() {
            merged_company.name = company_name(&symbol).map(str::to_string);
        }
        let company = if merged_company.is_empty() {
            None
        } else {
            merged_company.updated_at = Some(Utc::now());
            Some(merged_company)
        };

        let news = news.unwrap_or_default();
        if !news.is_empty() {
            if self.finnhub.is_some() {
                sources.push("finnhub".to_string());
            }
            if self.news_api.is_some() {
                sources.push("newsapi".to_string());
            }
        }

        let mut unique_sources: Vec<String> = Vec::with_capacity(sources.len());
        for source in sources {
            if !unique_sources.contains(&source) {
                unique_sources.push(source);
            }
        }

        let current_price = quote
            .as_ref()
            .and_then(|q| q.price)
            .or(history.meta.price);
        let previous_close = quote
            .as_ref()
            .and_then(|q| q.previous_close)
            .or(history.meta.previous_close);

        debug!(
            "{}: {} bars, {} dividends, {} articles",
            symbol,
            history.bars.len(),
            dividends.len(),
            news.len()
        );

        Ok(MarketData {
            symbol,
            period,
            bars: history.bars,
            current_price,
            previous_close,
            dividends,
            company,
            news,
            sources: unique_sources,
        })
    }

    /// Daily history from Yahoo, falling back to Alpha Vantage bars when
    /// Yahoo fails. Returns the history and the provider that served it.
    async fn fetch_history(&self, symbol: &str, period: Period) -> Result<(YahooHistory, String)> {
        let key = cache_key("history", &[symbol, period.as_str()]);
        self.cache
            .try_read_through(&key, CacheCategory::HistoricalPrices, || async {
                let reason = match self.yahoo.get_history(symbol, period).await {
                    Ok(history) => return Ok((history, "yahoo".to_string())),
                    Err(reason) => reason,
                };
                warn!("Yahoo history failed for {}: {}", symbol, reason);

                let Some(client) = &self.alpha_vantage else {
                    return Err(AppError::ProviderUnavailable {
                        symbol: symbol.to_string(),
                        reason,
                    });
                };
                let output_size = match period {
                    Period::FiveDays | Period::OneMonth | Period::ThreeMonths => "compact",
                    _ => "full",
                };
                let mut bars = client
                    .get_daily_time_series(symbol, output_size)
                    .await
                    .map_err(|e| {
                        warn!("Alpha Vantage history failed for {}: {}", symbol, e);
                        AppError::ProviderUnavailable {
                            symbol: symbol.to_string(),
                            reason: format!("{}; Alpha Vantage: {}", reason, e),
                        }
                    })?;
                if let Some(start) = period.start_date(Utc::now().date_naive()) {
                    bars.retain(|b| b.date >= start);
                }
                let history = YahooHistory {
                    bars,
                    ..Default::default()
                };
                Ok((history, "alphavantage".to_string()))
            })
            .await
    }

    async fn fetch_quote(&self, symbol: &str) -> Option<YahooQuoteMeta> {
        let key = cache_key("quote", &[symbol]);
        self.cache
            .read_through(&key, CacheCategory::CurrentPrice, || async {
                match self.yahoo.get_quote(symbol).await {
                    Ok(quote) if quote.price.is_some() => return Some(quote),
                    Ok(_) => debug!("Yahoo quote for {} had no price", symbol),
                    Err(e) => warn!("Yahoo quote failed for {}: {}", symbol, e),
                }
                let client = self.alpha_vantage.as_ref()?;
                match client.get_quote(symbol).await {
                    Ok(q) => Some(YahooQuoteMeta {
                        price: Some(q.price),
                        previous_close: q.previous_close,
                        ..Default::default()
                    }),
                    Err(e) => {
                        warn!("Alpha Vantage quote failed for {}: {}", symbol, e);
                        None
                    }
                }
            })
            .await
    }

    async fn fetch_dividends(&self, symbol: &str) -> Option<Vec<DividendEvent>> {
        let key = cache_key("dividends", &[symbol]);
        self.cache
            .read_through(&key, CacheCategory::Dividends, || async {
                match self.yahoo.get_history(symbol, Period::Max).await {
                    Ok(history) => Some(history.dividends),
                    Err(e) => {
                        warn!("Yahoo dividend history failed for {}: {}", symbol, e);
                        None
                    }
                }
            })
            .await
    }

    /// Fundamentals from the optional providers, with the provider names
    /// that contributed.
    async fn fetch_company(&self, symbol: &str) -> Option<(CompanyInfo, Vec<String>)> {
        if self.finnhub.is_none() && self.alpha_vantage.is_none() {
            return None;
        }
        let key = cache_key("company", &[symbol]);
        self.cache
            .read_through(&key, CacheCategory::CompanyInfo, || async {
                let finnhub = async {
                    let client = self.finnhub.as_ref()?;
                    client
                        .get_profile(symbol)
                        .await
                        .map_err(|e| warn!("Finnhub profile failed for {}: {}", symbol, e))
                        .ok()
                };
                let alpha_vantage = async {
                    let client = self.alpha_vantage.as_ref()?;
                    client
                        .get_company_overview(symbol)
                        .await
                        .map_err(|e| warn!("Alpha Vantage overview failed for {}: {}", symbol, e))
                        .ok()
                };
                let (finnhub, alpha_vantage) = join(finnhub, alpha_vantage).await;

                let mut info = CompanyInfo::new(symbol);
                let mut sources = Vec::new();
                if let Some(profile) = finnhub.filter(|p| !p.is_empty()) {
                    info.merge(profile);
                    sources.push("finnhub".to_string());
                }
                if let Some(overview) = alpha_vantage.filter(|o| !o.is_empty()) {
                    info.merge(overview);
                    sources.push("alphavantage".to_string());
                }
                if sources.is_empty() {
                    None
                } else {
                    Some((info, sources))
                }
            })
            .await
    }

    async fn fetch_news(&self, symbol: &str) -> Option<Vec<NewsArticle>> {
        if !self.capabilities.news() {
            return None;
        }
        let key = cache_key("news", &[symbol.to_string(), NEWS_LOOKBACK_DAYS.to_string()]);
        self.cache
            .read_through(&key, CacheCategory::News, || async {
                let today = Utc::now().date_naive();
                let from = today - Duration::days(NEWS_LOOKBACK_DAYS);

                let finnhub = async {
                    match &self.finnhub {
                        Some(client) => client
                            .get_company_news(symbol, from, today)
                            .await
                            .unwrap_or_else(|e| {
                                warn!("Finnhub news failed for {}: {}", symbol, e);
                                Vec::new()
                            }),
                        None => Vec::new(),
                    }
                };
                let news_api = async {
                    let query = company_name(symbol).unwrap_or(base_ticker(symbol));
                    match &self.news_api {
                        Some(client) => client.search(query, symbol, from).await.unwrap_or_else(|e| {
                            warn!("NewsAPI search failed for {}: {}", symbol, e);
                            Vec::new()
                        }),
                        None => Vec::new(),
                    }
                };
                let (mut articles, more) = join(finnhub, news_api).await;
                articles.extend(more);

                let mut articles = merge_articles(articles);
                sentiment::annotate(&mut articles);
                if articles.is_empty() {
                    None
                } else {
                    Some(articles)
                }
            })
            .await
    }

    /// Compute the full report from already-fetched data.
    pub fn analyze(&self, data: &MarketData) -> Result<AnalysisReport> {
        self.build_report(data, &IndicatorSet::compute_default(&data.bars))
    }

    fn build_report(&self, data: &MarketData, indicator_set: &IndicatorSet) -> Result<AnalysisReport> {
        let (first, last) = match (data.bars.first(), data.bars.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(AppError::InsufficientData(format!(
                    "No price bars for {}",
                    data.symbol
                )))
            }
        };

        let closes = closes(&data.bars);
        let indicators = indicator_set.latest_values();
        let price = price_summary(data, last);

        let signals = TechnicalSignals {
            rsi: indicators.get("rsi_14").map(|v| RsiZone::from_rsi(*v)),
            price_vs_sma20: indicators
                .get("sma_20")
                .map(|v| MaPosition::of(last.close, *v)),
            price_vs_sma50: indicators
                .get("sma_50")
                .map(|v| MaPosition::of(last.close, *v)),
        };

        let (trend, levels, volatility) = if self.capabilities.predictive {
            let levels = support_resistance(&closes, LEVEL_WINDOW);
            (
                predict_trend(&closes, FORECAST_DAYS),
                (!levels.support.is_empty() || !levels.resistance.is_empty()).then_some(levels),
                volatility_forecast(&closes, VOLATILITY_WINDOW),
            )
        } else {
            (None, None, None)
        };

        Ok(AnalysisReport {
            symbol: data.symbol.clone(),
            display_name: Some(display_name(&data.symbol)),
            period: data.period,
            generated_at: Utc::now(),
            data_points: data.bars.len(),
            start_date: first.date,
            end_date: last.date,
            returns: return_metrics(&closes),
            dividends: dividend_metrics(&data.dividends, Some(price.current_price)),
            price,
            indicators,
            signals,
            patterns: detect_patterns(&data.bars, MAX_PATTERN_SCAN),
            company: data.company.clone(),
            trend,
            support_resistance: levels,
            volatility,
            sentiment: MarketSentiment::from_articles(&data.news),
            news: data.news.clone(),
            sources: data.sources.clone(),
        })
    }

    /// Gather, persist, analyze and persist the indicator values.
    ///
    /// Persistence failures are logged; the report is still returned.
    pub async fn run_analysis(&self, symbol: &str, period: Period) -> Result<AnalysisReport> {
        let data = self.gather(symbol, period).await?;
        self.persist(&data);

        let indicator_set = IndicatorSet::compute_default(&data.bars);
        let report = self.build_report(&data, &indicator_set)?;
        if let Some(store) = &self.store {
            let values = indicator_set.recent_values(PERSISTED_INDICATOR_BARS);
            let saved = store.save_indicator_values(&data.symbol, &values);
            debug!("Saved {} indicator values for {}", saved, data.symbol);
        }

        info!(
            "Analysis complete for {}: {} bars, {} patterns",
            report.symbol,
            report.data_points,
            report.patterns.total()
        );
        Ok(report)
    }

    /// Write the fetched data to the database, if one is configured.
    pub fn persist(&self, data: &MarketData) {
        let Some(store) = &self.store else {
            return;
        };

        let prices = store.save_stock_prices(&data.symbol, &data.bars);
        let dividends = store.save_dividends(&data.symbol, &data.dividends);
        let articles = store.save_news_articles(&data.news);
        if let Some(info) = &data.company {
            if let Err(e) = store.save_company_info(info) {
                warn!("Failed to save company info for {}: {}", data.symbol, e);
            }
        }
        debug!(
            "Persisted {}: {} new prices, {} new dividends, {} new articles",
            data.symbol, prices, dividends, articles
        );
    }

    /// Stored bars for `symbol` between `start` and `end`.
    pub fn stored_prices(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<PriceBar> {
        let symbol = self.normalize_symbol(symbol);
        self.store
            .as_ref()
            .map(|s| s.get_stock_prices(&symbol, start, end))
            .unwrap_or_default()
    }

    /// Drop every cached entry for `symbol`. Returns the number removed.
    pub async fn clear_cache(&self, symbol: &str) -> usize {
        let symbol = self.normalize_symbol(symbol);
        self.cache.clear_symbol(&symbol).await
    }
}
