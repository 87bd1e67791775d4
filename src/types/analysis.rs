use super::{CompanyInfo, MarketSentiment, NewsArticle, Period};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single persisted indicator reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorValue {
    pub date: NaiveDate,
    pub name: String,
    pub value: f64,
}

/// Dates at which each candle or crossover pattern held.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternHits {
    pub hammer: Vec<NaiveDate>,
    pub shooting_star: Vec<NaiveDate>,
    pub doji: Vec<NaiveDate>,
    pub bullish_engulfing: Vec<NaiveDate>,
    pub bearish_engulfing: Vec<NaiveDate>,
    pub golden_cross: Vec<NaiveDate>,
    pub death_cross: Vec<NaiveDate>,
}

impl PatternHits {
    /// Total number of hits across all patterns.
    pub fn total(&self) -> usize {
        self.hammer.len()
            + self.shooting_star.len()
            + self.doji.len()
            + self.bullish_engulfing.len()
            + self.bearish_engulfing.len()
            + self.golden_cross.len()
            + self.death_cross.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Return and risk summary over a close series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    /// Absent when volatility is zero or undefined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
    pub avg_daily_return: f64,
    pub daily_return_std: f64,
    pub trading_days: usize,
}

/// Dividend totals for one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyDividend {
    pub year: i32,
    pub total: f64,
    pub count: usize,
}

/// Dividend summary over the available history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendMetrics {
    /// Sum paid in the most recent calendar year with a payment.
    pub annual_dividend: f64,
    /// Annual dividend as a percentage of the current price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_yield: Option<f64>,
    /// Mean year-over-year growth of annual totals, in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<f64>,
    pub payments_per_year: f64,
    pub total_paid: f64,
    pub history: Vec<YearlyDividend>,
}

/// Direction of a fitted trend line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Bullish,
    Bearish,
}

/// Linear trend projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPrediction {
    pub direction: TrendDirection,
    pub slope: f64,
    /// Slope as a percentage of the mean price.
    pub strength: f64,
    pub r_squared: f64,
    pub current_price: f64,
    pub predicted_price: f64,
    pub predicted_change_pct: f64,
    pub days_ahead: usize,
    pub predictions: Vec<f64>,
}

/// Local extrema acting as support and resistance levels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportResistance {
    /// Lowest local minima, ascending.
    pub support: Vec<f64>,
    /// Highest local maxima, descending.
    pub resistance: Vec<f64>,
}

/// Rolling volatility summary, annualized and in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolatilityForecast {
    pub current: f64,
    pub average: f64,
    /// Mean of the last 5 readings minus the mean of the 10 before them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<f64>,
    pub percentile: f64,
}

/// Headline price figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub current_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
    pub high_52w: f64,
    pub low_52w: f64,
    pub as_of: NaiveDate,
}

/// RSI reading classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn from_rsi(rsi: f64) -> Self {
        if rsi > 70.0 {
            RsiZone::Overbought
        } else if rsi < 30.0 {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }
}

/// Price position relative to a moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaPosition {
    Above,
    Below,
}

impl MaPosition {
    pub fn of(price: f64, average: f64) -> Self {
        if price > average {
            MaPosition::Above
        } else {
            MaPosition::Below
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSignals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<RsiZone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_vs_sma20: Option<MaPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_vs_sma50: Option<MaPosition>,
}

/// Full analysis result for one symbol and period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub period: Period,
    pub generated_at: DateTime<Utc>,
    pub data_points: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: PriceSummary,
    /// Latest defined value of each indicator series.
    pub indicators: BTreeMap<String, f64>,
    pub signals: TechnicalSignals,
    pub patterns: PatternHits,
    pub returns: Option<ReturnMetrics>,
    pub dividends: Option<DividendMetrics>,
    pub company: Option<CompanyInfo>,
    pub trend: Option<TrendPrediction>,
    pub support_resistance: Option<SupportResistance>,
    pub volatility: Option<VolatilityForecast>,
    pub sentiment: Option<MarketSentiment>,
    pub news: Vec<NewsArticle>,
    /// Providers that contributed data to this report.
    pub sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_zone_boundaries() {
        assert_eq!(RsiZone::from_rsi(70.1), RsiZone::Overbought);
        assert_eq!(RsiZone::from_rsi(70.0), RsiZone::Neutral);
        assert_eq!(RsiZone::from_rsi(30.0), RsiZone::Neutral);
        assert_eq!(RsiZone::from_rsi(29.9), RsiZone::Oversold);
    }

    #[test]
    fn test_ma_position() {
        assert_eq!(MaPosition::of(10.0, 9.0), MaPosition::Above);
        assert_eq!(MaPosition::of(9.0, 10.0), MaPosition::Below);
        assert_eq!(MaPosition::of(10.0, 10.0), MaPosition::Below);
    }

    #[test]
    fn test_pattern_hits_total() {
        let mut hits = PatternHits::default();
        assert!(hits.is_empty());
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        hits.doji.push(day);
        hits.golden_cross.push(day);
        assert_eq!(hits.total(), 2);
    }

    #[test]
    fn test_return_metrics_omits_undefined_sharpe() {
        let metrics = ReturnMetrics {
            total_return: 0.0,
            annualized_return: 0.0,
            volatility: 0.0,
            sharpe_ratio: None,
            max_drawdown: 0.0,
            avg_daily_return: 0.0,
            daily_return_std: 0.0,
            trading_days: 10,
        };
        let json = serde_json::to_string(&metrics).unwrap();
        assert!(!json.contains("sharpeRatio"));
        assert!(json.contains("\"maxDrawdown\":0.0"));
    }
}
