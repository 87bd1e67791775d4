//! Finnhub API client.
//!
//! Supplies company profiles and company news.

use super::http::{HttpSettings, RetryingClient};
use crate::types::{CompanyInfo, NewsArticle};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;

const FINNHUB_URL: &str = "https://finnhub.io/api/v1";

/// Minimum spacing between Finnhub requests.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Finnhub company profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinnhubProfile {
    currency: Option<String>,
    exchange: Option<String>,
    #[serde(rename = "finnhubIndustry")]
    industry: Option<String>,
    /// Millions.
    market_capitalization: Option<f64>,
    name: Option<String>,
    /// Millions.
    share_outstanding: Option<f64>,
    weburl: Option<String>,
}

/// Finnhub company news item.
#[derive(Debug, Clone, Deserialize)]
struct FinnhubNewsItem {
    datetime: i64,
    headline: String,
    source: Option<String>,
    summary: Option<String>,
    url: String,
}

/// Finnhub API client.
pub struct FinnhubClient {
    http: RetryingClient,
    api_key: String,
    base_url: String,
}

impl FinnhubClient {
    /// Create a new Finnhub client.
    pub fn new(api_key: String, settings: HttpSettings) -> Result<Self, String> {
        Ok(Self {
            http: RetryingClient::new("finnhub", settings, MIN_INTERVAL)?,
            api_key,
            base_url: FINNHUB_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Get company profile.
    pub async fn get_profile(&self, symbol: &str) -> Result<CompanyInfo, String> {
        let url = format!(
            "{}/stock/profile2?symbol={}&token={}",
            self.base_url, symbol, self.api_key
        );
        let profile: FinnhubProfile = self.http.get_json(&url).await?;
        Ok(profile_to_info(symbol, profile))
    }

    /// Company news published between `from` and `to`.
    pub async fn get_company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NewsArticle>, String> {
        let url = format!(
            "{}/company-news?symbol={}&from={}&to={}&token={}",
            self.base_url,
            symbol,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d"),
            self.api_key
        );
        let items: Vec<FinnhubNewsItem> = self.http.get_json(&url).await?;
        Ok(items
            .into_iter()
            .filter_map(|item| news_item_to_article(symbol, item))
            .collect())
    }
}

fn profile_to_info(symbol: &str, profile: FinnhubProfile) -> CompanyInfo {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    CompanyInfo {
        symbol: symbol.to_string(),
        name: non_empty(profile.name),
        industry: non_empty(profile.industry),
        currency: non_empty(profile.currency),
        exchange: non_empty(profile.exchange),
        website: non_empty(profile.weburl),
        market_cap: profile.market_capitalization.map(|mc| mc * 1_000_000.0),
        shares_outstanding: profile.share_outstanding.map(|s| s * 1_000_000.0),
        updated_at: Some(Utc::now()),
        ..Default::default()
    }
}

fn news_item_to_article(symbol: &str, item: FinnhubNewsItem) -> Option<NewsArticle> {
    if item.url.is_empty() || item.headline.trim().is_empty() {
        return None;
    }
    Some(NewsArticle {
        title: item.headline,
        url: item.url,
        source: item.source.unwrap_or_else(|| "Finnhub".to_string()),
        published_at: DateTime::from_timestamp(item.datetime, 0)?,
        description: item.summary.filter(|s| !s.is_empty()),
        symbol: Some(symbol.to_string()),
        sentiment: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_scales_millions() {
        let json = r#"{
            "country": "AU", "currency": "AUD", "exchange": "ASX",
            "finnhubIndustry": "Financial Services", "marketCapitalization": 9100.5,
            "name": "Australian Foundation Investment Co", "shareOutstanding": 1250.0,
            "ticker": "AFI.AX", "weburl": ""
        }"#;
        let profile: FinnhubProfile = serde_json::from_str(json).unwrap();
        let info = profile_to_info("AFI.AX", profile);
        assert_eq!(info.market_cap, Some(9_100_500_000.0));
        assert_eq!(info.shares_outstanding, Some(1_250_000_000.0));
        assert_eq!(info.industry.as_deref(), Some("Financial Services"));
        assert_eq!(info.website, None);
    }

    #[test]
    fn test_empty_profile() {
        let profile: FinnhubProfile = serde_json::from_str("{}").unwrap();
        assert!(profile_to_info("XYZ.AX", profile).is_empty());
    }

    #[test]
    fn test_news_items() {
        let json = r#"[
            {"category": "company", "datetime": 1709600000, "headline": "AFI lifts interim dividend",
             "id": 1, "image": "", "related": "AFI.AX", "source": "MarketWatch",
             "summary": "The listed investment company lifted its payout.", "url": "https://example.com/afi"},
            {"category": "company", "datetime": 1709600000, "headline": "", "id": 2,
             "source": "X", "summary": "", "url": "https://example.com/blank"}
        ]"#;
        let items: Vec<FinnhubNewsItem> = serde_json::from_str(json).unwrap();
        let articles: Vec<NewsArticle> = items
            .into_iter()
            .filter_map(|i| news_item_to_article("AFI.AX", i))
            .collect();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "MarketWatch");
        assert_eq!(articles[0].symbol.as_deref(), Some("AFI.AX"));
        assert_eq!(articles[0].published_at.timestamp(), 1709600000);
    }
}
