//! Technical indicator and pattern service module.
//!
//! Provides windowed indicator calculations over price history and the
//! candle/crossover pattern scanner built on top of them.

pub mod indicators;
pub mod patterns;

pub use indicators::Series;
pub use patterns::{detect_patterns, MAX_PATTERN_SCAN};

use crate::types::{IndicatorValue, PriceBar};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Broad grouping of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorCategory {
    Trend,
    Momentum,
    Volatility,
}

/// One output series of an indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub name: String,
    pub values: Series,
}

impl NamedSeries {
    pub fn new(name: impl Into<String>, values: Series) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Trait for implementing technical indicators.
pub trait Indicator: Send + Sync {
    /// Unique identifier, also the prefix of every output name.
    fn id(&self) -> String;

    /// Category this indicator belongs to.
    fn category(&self) -> IndicatorCategory;

    /// Minimum number of bars before the first output is defined.
    fn min_periods(&self) -> usize;

    /// Compute all output series, each aligned with `bars`.
    fn compute(&self, bars: &[PriceBar]) -> Vec<NamedSeries>;
}

/// The indicator set used for reports and persistence.
pub fn default_indicators() -> Vec<Box<dyn Indicator>> {
    use indicators::*;

    vec![
        Box::new(Sma::new(20)),
        Box::new(Sma::new(50)),
        Box::new(Sma::new(200)),
        Box::new(Ema::new(12)),
        Box::new(Ema::new(26)),
        Box::new(Rsi::default()),
        Box::new(Macd::default()),
        Box::new(Bollinger::default()),
        Box::new(Stochastic::default()),
        Box::new(Atr::default()),
        Box::new(WilliamsR::default()),
        Box::new(Momentum::new(10)),
        Box::new(RateOfChange::new(10)),
    ]
}

/// Indicator outputs aligned with the dates of the input bars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub dates: Vec<NaiveDate>,
    pub series: Vec<NamedSeries>,
}

impl IndicatorSet {
    /// Run every indicator over `bars`.
    pub fn compute(bars: &[PriceBar], indicators: &[Box<dyn Indicator>]) -> Self {
        Self {
            dates: bars.iter().map(|b| b.date).collect(),
            series: indicators.iter().flat_map(|i| i.compute(bars)).collect(),
        }
    }

    /// Run the default indicator set over `bars`.
    pub fn compute_default(bars: &[PriceBar]) -> Self {
        Self::compute(bars, &default_indicators())
    }

    pub fn get(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name).map(|s| &s.values)
    }

    /// Value at the most recent bar, if defined there.
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|s| indicators::latest(s))
    }

    /// Value of every series at the most recent bar, where defined.
    pub fn latest_values(&self) -> BTreeMap<String, f64> {
        self.series
            .iter()
            .filter_map(|s| indicators::latest(&s.values).map(|v| (s.name.clone(), v)))
            .collect()
    }

    /// Defined values over the most recent `last_n` bars, for persistence.
    pub fn recent_values(&self, last_n: usize) -> Vec<IndicatorValue> {
        let start = self.dates.len().saturating_sub(last_n);
        let mut values = Vec::new();
        for series in &self.series {
            for (i, date) in self.dates.iter().enumerate().skip(start) {
                if let Some(Some(value)) = series.values.get(i) {
                    values.push(IndicatorValue {
                        date: *date,
                        name: series.name.clone(),
                        value: *value,
                    });
                }
            }
        }
        values
    }
}
