//! Yahoo Finance chart API client.
//!
//! The primary source of daily bars, dividend events and the live quote.
//! Uses the unofficial chart endpoint, which needs no API key.

use super::http::{HttpSettings, RetryingClient};
use crate::types::{DividendEvent, Period, PriceBar};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Minimum spacing between Yahoo requests.
const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Yahoo Finance chart response.
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    meta: YahooMeta,
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
    events: Option<YahooEvents>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    currency: Option<String>,
    /// Exchange offset from UTC in seconds.
    gmtoffset: Option<i64>,
    exchange_name: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
    adjclose: Option<Vec<YahooAdjClose>>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct YahooAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooEvents {
    dividends: Option<HashMap<String, YahooDividend>>,
}

#[derive(Debug, Deserialize)]
struct YahooDividend {
    amount: f64,
    date: i64,
}

/// Live quote fields carried in the chart metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteMeta {
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub previous_close: Option<f64>,
    pub week_52_high: Option<f64>,
    pub week_52_low: Option<f64>,
}

/// Daily history for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YahooHistory {
    pub bars: Vec<PriceBar>,
    pub dividends: Vec<DividendEvent>,
    pub meta: YahooQuoteMeta,
}

/// Yahoo Finance API client.
pub struct YahooFinanceClient {
    http: RetryingClient,
    base_url: String,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client.
    pub fn new(settings: HttpSettings) -> Result<Self, String> {
        Ok(Self {
            http: RetryingClient::new("yahoo", settings, MIN_INTERVAL)?,
            base_url: YAHOO_CHART_URL.to_string(),
        })
    }

    /// Point the client at another chart endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn chart_url(&self, symbol: &str, range: &str) -> String {
        format!(
            "{}/{}?range={}&interval=1d&events=div&includeAdjustedClose=true&includePrePost=false",
            self.base_url,
            symbol.to_uppercase(),
            range
        )
    }

    /// Fetch daily bars and dividends covering `period`.
    pub async fn get_history(&self, symbol: &str, period: Period) -> Result<YahooHistory, String> {
        let data: YahooChartResponse = self
            .http
            .get_json(&self.chart_url(symbol, period.as_str()))
            .await?;
        let history = parse_chart(data)?;
        debug!(
            "Yahoo returned {} bars and {} dividends for {}",
            history.bars.len(),
            history.dividends.len(),
            symbol
        );
        Ok(history)
    }

    /// Fetch the live quote from a short chart request.
    pub async fn get_quote(&self, symbol: &str) -> Result<YahooQuoteMeta, String> {
        let data: YahooChartResponse = self.http.get_json(&self.chart_url(symbol, "5d")).await?;
        let history = parse_chart(data)?;
        let mut meta = history.meta;
        if meta.price.is_none() {
            meta.price = history.bars.last().map(|b| b.close);
        }
        Ok(meta)
    }
}

fn parse_chart(data: YahooChartResponse) -> Result<YahooHistory, String> {
    if let Some(error) = data.chart.error {
        return Err(format!(
            "Yahoo API error: {} - {}",
            error.code, error.description
        ));
    }

    let result = data
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| "No results in response".to_string())?;

    // Bars are stamped at the exchange open; shift into exchange local time
    // so an ASX session does not land on the previous UTC day.
    let offset = result.meta.gmtoffset.unwrap_or(0);
    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adj_closes = result
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let Some(date) = date_from_timestamp(ts + offset) else {
            continue;
        };
        // Holidays come back with every field null.
        let Some(close) = quote.close.get(i).copied().flatten() else {
            continue;
        };
        let open = quote.open.get(i).copied().flatten().unwrap_or(close);
        let high = quote.high.get(i).copied().flatten().unwrap_or(close);
        let low = quote.low.get(i).copied().flatten().unwrap_or(close);

        let mut bar = PriceBar::new(date, open, high, low, close);
        if let Some(volume) = quote.volume.get(i).copied().flatten() {
            bar = bar.with_volume(volume);
        }
        if let Some(adj) = adj_closes.get(i).copied().flatten() {
            bar = bar.with_adjusted_close(adj);
        }
        bars.push(bar);
    }
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);

    let mut dividends: Vec<DividendEvent> = result
        .events
        .and_then(|e| e.dividends)
        .unwrap_or_default()
        .into_values()
        .filter_map(|d| Some(DividendEvent::new(date_from_timestamp(d.date + offset)?, d.amount)))
        .collect();
    dividends.sort_by_key(|d| d.ex_date);

    let meta = result.meta;
    Ok(YahooHistory {
        bars,
        dividends,
        meta: YahooQuoteMeta {
            currency: meta.currency,
            exchange: meta.exchange_name,
            name: meta.long_name.or(meta.short_name),
            price: meta.regular_market_price,
            previous_close: meta.previous_close.or(meta.chart_previous_close),
            week_52_high: meta.fifty_two_week_high,
            week_52_low: meta.fifty_two_week_low,
        },
    })
}

fn date_from_timestamp(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|t| t.date_naive())
}
