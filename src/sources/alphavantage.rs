//! Alpha Vantage API client.
//!
//! Secondary source for daily bars and quotes, and the main source of
//! company fundamentals. The free tier allows 5 requests a minute, so
//! requests are spaced 12 seconds apart.

use super::http::{HttpSettings, RetryingClient};
use crate::types::{CompanyInfo, PriceBar};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

/// Minimum spacing between Alpha Vantage requests.
const MIN_INTERVAL: Duration = Duration::from_secs(12);

/// Throttle and error notices Alpha Vantage returns with a 200 status.
#[derive(Debug, Clone, Default, Deserialize)]
struct Notices {
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

impl Notices {
    fn into_error(self) -> Option<String> {
        if let Some(msg) = self.error_message {
            return Some(format!("Alpha Vantage error: {}", msg));
        }
        self.note
            .or(self.information)
            .map(|msg| format!("Alpha Vantage rate limited: {}", msg))
    }
}

/// Alpha Vantage global quote response.
#[derive(Debug, Clone, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(flatten)]
    notices: Notices,
}

/// Global quote data.
#[derive(Debug, Clone, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close")]
    previous_close: Option<String>,
}

/// Time series daily response.
#[derive(Debug, Clone, Deserialize)]
struct TimeSeriesDailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, TimeSeriesDataPoint>>,
    #[serde(flatten)]
    notices: Notices,
}

/// Individual time series data point.
#[derive(Debug, Clone, Deserialize)]
struct TimeSeriesDataPoint {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: Option<String>,
}

/// Company overview data.
#[derive(Debug, Clone, Default, Deserialize)]
struct CompanyOverview {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Exchange")]
    exchange: Option<String>,
    #[serde(rename = "Currency")]
    currency: Option<String>,
    #[serde(rename = "Sector")]
    sector: Option<String>,
    #[serde(rename = "Industry")]
    industry: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    market_cap: Option<String>,
    #[serde(rename = "PERatio")]
    pe_ratio: Option<String>,
    #[serde(rename = "PriceToBookRatio")]
    pb_ratio: Option<String>,
    #[serde(rename = "DividendYield")]
    dividend_yield: Option<String>,
    #[serde(rename = "PayoutRatio")]
    payout_ratio: Option<String>,
    #[serde(rename = "Beta")]
    beta: Option<String>,
    #[serde(rename = "SharesOutstanding")]
    shares_outstanding: Option<String>,
    #[serde(rename = "SharesFloat")]
    float_shares: Option<String>,
    #[serde(rename = "52WeekHigh")]
    week_52_high: Option<String>,
    #[serde(rename = "52WeekLow")]
    week_52_low: Option<String>,
    #[serde(rename = "FullTimeEmployees")]
    employees: Option<String>,
    #[serde(rename = "OfficialSite")]
    website: Option<String>,
    #[serde(flatten)]
    notices: Notices,
}

/// Latest quote.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaVantageQuote {
    pub price: f64,
    pub previous_close: Option<f64>,
    pub trading_day: Option<NaiveDate>,
}

/// Alpha Vantage API client.
pub struct AlphaVantageClient {
    http: RetryingClient,
    api_key: String,
    base_url: String,
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client.
    pub fn new(api_key: String, settings: HttpSettings) -> Result<Self, String> {
        Ok(Self {
            http: RetryingClient::new("alphavantage", settings, MIN_INTERVAL)?,
            api_key,
            base_url: ALPHA_VANTAGE_URL.to_string(),
        })
    }

    /// Point the client at another query endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Get the latest quote for a symbol.
    pub async fn get_quote(&self, symbol: &str) -> Result<AlphaVantageQuote, String> {
        let url = format!(
            "{}?function=GLOBAL_QUOTE&symbol={}&apikey={}",
            self.base_url, symbol, self.api_key
        );
        let data: GlobalQuoteResponse = self.http.get_json(&url).await?;
        parse_quote(data)
    }

    /// Get daily bars, oldest first.
    ///
    /// `output_size` is "compact" (100 days) or "full" (20+ years).
    pub async fn get_daily_time_series(
        &self,
        symbol: &str,
        output_size: &str,
    ) -> Result<Vec<PriceBar>, String> {
        let url = format!(
            "{}?function=TIME_SERIES_DAILY&symbol={}&outputsize={}&apikey={}",
            self.base_url, symbol, output_size, self.api_key
        );
        let data: TimeSeriesDailyResponse = self.http.get_json(&url).await?;
        parse_time_series(data)
    }

    /// Get company fundamentals.
    pub async fn get_company_overview(&self, symbol: &str) -> Result<CompanyInfo, String> {
        let url = format!(
            "{}?function=OVERVIEW&symbol={}&apikey={}",
            self.base_url, symbol, self.api_key
        );
        let data: CompanyOverview = self.http.get_json(&url).await?;
        parse_overview(symbol, data)
    }
}

/// Alpha Vantage encodes numbers as strings and missing values as "None" or "-".
fn parse_number(value: &Option<String>) -> Option<f64> {
    value
        .as_deref()
        .map(str::trim)
        .and_then(|v| v.trim_end_matches('%').parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_text(value: Option<String>) -> Option<String> {
    value.filter(|v| {
        let v = v.trim();
        !v.is_empty() && v != "None" && v != "-"
    })
}

fn parse_quote(data: GlobalQuoteResponse) -> Result<AlphaVantageQuote, String> {
    if let Some(err) = data.notices.into_error() {
        return Err(err);
    }
    let quote = data
        .global_quote
        .ok_or_else(|| "No quote data available".to_string())?;
    let price = parse_number(&quote.price).ok_or_else(|| "Quote has no price".to_string())?;

    Ok(AlphaVantageQuote {
        price,
        previous_close: parse_number(&quote.previous_close),
        trading_day: quote
            .latest_trading_day
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
    })
}

fn parse_time_series(data: TimeSeriesDailyResponse) -> Result<Vec<PriceBar>, String> {
    if let Some(err) = data.notices.into_error() {
        return Err(err);
    }
    let time_series = data
        .time_series
        .ok_or_else(|| "No time series data available".to_string())?;

    let mut bars: Vec<PriceBar> = time_series
        .into_iter()
        .filter_map(|(date_str, point)| {
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").ok()?;
            let bar = PriceBar::new(
                date,
                point.open.parse().ok()?,
                point.high.parse().ok()?,
                point.low.parse().ok()?,
                point.close.parse().ok()?,
            );
            Some(match point.volume.and_then(|v| v.parse::<u64>().ok()) {
                Some(volume) => bar.with_volume(volume),
                None => bar,
            })
        })
        .collect();

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

fn parse_overview(symbol: &str, data: CompanyOverview) -> Result<CompanyInfo, String> {
    let notices = data.notices.clone();
    if let Some(err) = notices.into_error() {
        return Err(err);
    }

    Ok(CompanyInfo {
        symbol: symbol.to_string(),
        market_cap: parse_number(&data.market_cap),
        // OVERVIEW carries EV multiples but not the figure itself.
        enterprise_value: None,
        pe_ratio: parse_number(&data.pe_ratio),
        pb_ratio: parse_number(&data.pb_ratio),
        dividend_yield: parse_number(&data.dividend_yield),
        payout_ratio: parse_number(&data.payout_ratio),
        beta: parse_number(&data.beta),
        shares_outstanding: parse_number(&data.shares_outstanding),
        float_shares: parse_number(&data.float_shares),
        week_52_high: parse_number(&data.week_52_high),
        week_52_low: parse_number(&data.week_52_low),
        employees: parse_number(&data.employees).map(|v| v as i64),
        name: parse_text(data.name),
        sector: parse_text(data.sector),
        industry: parse_text(data.industry),
        currency: parse_text(data.currency),
        exchange: parse_text(data.exchange),
        description: parse_text(data.description),
        website: parse_text(data.website),
        updated_at: Some(Utc::now()),
    })
}
