//! NewsAPI client for general press coverage of a company.

use super::http::{HttpSettings, RetryingClient};
use crate::types::NewsArticle;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;

const NEWS_API_URL: &str = "https://newsapi.org/v2/everything";

/// Minimum spacing between NewsAPI requests.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Articles requested per query.
const PAGE_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiResponse {
    status: String,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    source: Option<NewsApiSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

/// NewsAPI client.
pub struct NewsApiClient {
    http: RetryingClient,
    api_key: String,
    base_url: String,
}

impl NewsApiClient {
    pub fn new(api_key: String, settings: HttpSettings) -> Result<Self, String> {
        Ok(Self {
            http: RetryingClient::new("newsapi", settings, MIN_INTERVAL)?,
            api_key,
            base_url: NEWS_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// English articles matching `query` published since `from`, newest first.
    pub async fn search(
        &self,
        query: &str,
        symbol: &str,
        from: NaiveDate,
    ) -> Result<Vec<NewsArticle>, String> {
        let url = format!(
            "{}?q={}&from={}&sortBy=publishedAt&language=en&pageSize={}&apiKey={}",
            self.base_url,
            encode_query(query),
            from.format("%Y-%m-%d"),
            PAGE_SIZE,
            self.api_key
        );
        let data: NewsApiResponse = self.http.get_json(&url).await?;
        parse_response(symbol, data)
    }
}

/// Quote the query as a phrase and percent-encode the characters that
/// matter in a query string.
fn encode_query(query: &str) -> String {
    let mut encoded = String::from("%22");
    for c in query.trim().chars() {
        match c {
            ' ' => encoded.push_str("%20"),
            '&' => encoded.push_str("%26"),
            '#' => encoded.push_str("%23"),
            '+' => encoded.push_str("%2B"),
            '"' => {}
            c => encoded.push(c),
        }
    }
    encoded.push_str("%22");
    encoded
}

fn parse_response(symbol: &str, data: NewsApiResponse) -> Result<Vec<NewsArticle>, String> {
    if data.status != "ok" {
        return Err(format!(
            "NewsAPI error: {}",
            data.message.unwrap_or_else(|| data.status.clone())
        ));
    }

    Ok(data
        .articles
        .into_iter()
        .filter_map(|a| {
            let title = a.title.filter(|t| !t.trim().is_empty() && t != "[Removed]")?;
            let published_at = DateTime::parse_from_rfc3339(a.published_at.as_deref()?)
                .ok()?
                .with_timezone(&Utc);
            Some(NewsArticle {
                title,
                url: a.url.filter(|u| !u.is_empty())?,
                source: a
                    .source
                    .and_then(|s| s.name)
                    .unwrap_or_else(|| "NewsAPI".to_string()),
                published_at,
                description: a.description.filter(|d| !d.is_empty()),
                symbol: Some(symbol.to_string()),
                sentiment: None,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let json = r#"{
            "status": "ok", "totalResults": 3,
            "articles": [
                {"source": {"id": null, "name": "The Australian"}, "title": "AFI reports record profit",
                 "description": "Strong half.", "url": "https://example.com/1", "publishedAt": "2024-03-05T01:00:00Z"},
                {"source": {"id": null, "name": "X"}, "title": "[Removed]",
                 "description": null, "url": "https://removed.com", "publishedAt": "2024-03-05T01:00:00Z"},
                {"source": null, "title": "No date", "url": "https://example.com/2", "publishedAt": null}
            ]
        }"#;
        let data: NewsApiResponse = serde_json::from_str(json).unwrap();
        let articles = parse_response("AFI.AX", data).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "The Australian");
        assert_eq!(articles[0].description.as_deref(), Some("Strong half."));
    }

    #[test]
    fn test_error_status() {
        let json = r#"{"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."}"#;
        let data: NewsApiResponse = serde_json::from_str(json).unwrap();
        let err = parse_response("AFI.AX", data).unwrap_err();
        assert!(err.contains("API key is invalid"));
    }

    #[test]
    fn test_encode_query() {
        assert_eq!(
            encode_query("Australian Foundation & Co"),
            "%22Australian%20Foundation%20%26%20Co%22"
        );
    }
}
