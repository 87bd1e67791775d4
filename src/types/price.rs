use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lookback period for a price history request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    /// All supported periods, shortest first.
    pub const ALL: [Period; 10] = [
        Period::FiveDays,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::TenYears,
        Period::YearToDate,
        Period::Max,
    ];

    /// Parse the provider range notation ("1y", "6mo", ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "5d" => Some(Period::FiveDays),
            "1mo" => Some(Period::OneMonth),
            "3mo" => Some(Period::ThreeMonths),
            "6mo" => Some(Period::SixMonths),
            "1y" => Some(Period::OneYear),
            "2y" => Some(Period::TwoYears),
            "5y" => Some(Period::FiveYears),
            "10y" => Some(Period::TenYears),
            "ytd" => Some(Period::YearToDate),
            "max" => Some(Period::Max),
            _ => None,
        }
    }

    /// Provider range notation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }

    /// First calendar day covered by this period when it ends on `today`.
    /// `None` means unbounded.
    pub fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        let days = match self {
            Period::FiveDays => 5,
            Period::OneMonth => 30,
            Period::ThreeMonths => 91,
            Period::SixMonths => 182,
            Period::OneYear => 365,
            Period::TwoYears => 730,
            Period::FiveYears => 1826,
            Period::TenYears => 3652,
            Period::YearToDate => {
                return NaiveDate::from_ymd_opt(chrono::Datelike::year(&today), 1, 1);
            }
            Period::Max => return None,
        };
        Some(today - Duration::days(days))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::parse(s).ok_or_else(|| format!("Unknown period: {}", s))
    }
}

/// One trading session.
///
/// `low <= open, close <= high` is expected but not enforced; malformed
/// upstream rows are stored as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_close: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            adjusted_close: None,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_adjusted_close(mut self, adjusted_close: f64) -> Self {
        self.adjusted_close = Some(adjusted_close);
        self
    }

    /// Absolute size of the candle body.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Distance from the top of the body to the high.
    pub fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// Distance from the bottom of the body to the low.
    pub fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// Full high-low range.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Close prices of a bar slice.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// High prices of a bar slice.
pub fn highs(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.high).collect()
}

/// Low prices of a bar slice.
pub fn lows(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.low).collect()
}

/// A dividend distribution keyed by (symbol, ex-date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendEvent {
    pub ex_date: NaiveDate,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dividend_type: Option<String>,
}

impl DividendEvent {
    pub fn new(ex_date: NaiveDate, amount: f64) -> Self {
        Self {
            ex_date,
            amount,
            payment_date: None,
            dividend_type: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // =========================================================================
    // Period Tests
    // =========================================================================

    #[test]
    fn test_period_parse_all() {
        for period in Period::ALL {
            assert_eq!(Period::parse(period.as_str()), Some(period));
        }
    }

    #[test]
    fn test_period_parse_case_insensitive() {
        assert_eq!(Period::parse("1Y"), Some(Period::OneYear));
        assert_eq!(Period::parse(" 6MO "), Some(Period::SixMonths));
    }

    #[test]
    fn test_period_parse_invalid() {
        assert_eq!(Period::parse("3w"), None);
        assert!("bogus".parse::<Period>().is_err());
    }

    #[test]
    fn test_period_serialization() {
        let json = serde_json::to_string(&Period::ThreeMonths).unwrap();
        assert_eq!(json, "\"3mo\"");
        let parsed: Period = serde_json::from_str("\"ytd\"").unwrap();
        assert_eq!(parsed, Period::YearToDate);
    }

    #[test]
    fn test_period_start_date() {
        let today = date(2024, 6, 15);
        assert_eq!(Period::FiveDays.start_date(today), Some(date(2024, 6, 10)));
        assert_eq!(Period::YearToDate.start_date(today), Some(date(2024, 1, 1)));
        assert_eq!(Period::Max.start_date(today), None);
    }

    #[test]
    fn test_period_default_is_one_year() {
        assert_eq!(Period::default(), Period::OneYear);
    }

    // =========================================================================
    // PriceBar Tests
    // =========================================================================

    #[test]
    fn test_price_bar_candle_parts() {
        let bar = PriceBar::new(date(2024, 1, 2), 10.0, 12.0, 7.0, 10.5);
        assert!((bar.body() - 0.5).abs() < 1e-12);
        assert!((bar.upper_shadow() - 1.5).abs() < 1e-12);
        assert!((bar.lower_shadow() - 3.0).abs() < 1e-12);
        assert!((bar.range() - 5.0).abs() < 1e-12);
        assert!(bar.is_bullish());
        assert!(!bar.is_bearish());
    }

    #[test]
    fn test_price_bar_serialization_skips_missing() {
        let bar = PriceBar::new(date(2024, 1, 2), 1.0, 2.0, 0.5, 1.5);
        let json = serde_json::to_string(&bar).unwrap();
        assert!(json.contains("\"date\":\"2024-01-02\""));
        assert!(!json.contains("volume"));
        assert!(!json.contains("adjustedClose"));

        let bar = bar.with_volume(1000).with_adjusted_close(1.4);
        let json = serde_json::to_string(&bar).unwrap();
        assert!(json.contains("\"volume\":1000"));
        assert!(json.contains("\"adjustedClose\":1.4"));
    }

    #[test]
    fn test_series_extractors() {
        let bars = vec![
            PriceBar::new(date(2024, 1, 2), 1.0, 3.0, 0.5, 2.0),
            PriceBar::new(date(2024, 1, 3), 2.0, 4.0, 1.5, 3.0),
        ];
        assert_eq!(closes(&bars), vec![2.0, 3.0]);
        assert_eq!(highs(&bars), vec![3.0, 4.0]);
        assert_eq!(lows(&bars), vec![0.5, 1.5]);
    }

    #[test]
    fn test_dividend_event_new() {
        let dividend = DividendEvent::new(date(2024, 3, 1), 0.14);
        assert_eq!(dividend.amount, 0.14);
        assert!(dividend.payment_date.is_none());
        assert!(dividend.dividend_type.is_none());
    }
}
