//! Simple Moving Average (SMA) indicator.

use super::{mean, rolling, Series};
use crate::services::signals::{Indicator, IndicatorCategory, NamedSeries};
use crate::types::{closes, PriceBar};

/// Trailing arithmetic mean over `window` points.
pub fn sma(values: &[f64], window: usize) -> Series {
    rolling(values, window, |w| Some(mean(w)))
}

/// SMA of closing prices.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Sma {
    fn id(&self) -> String {
        format!("sma_{}", self.period)
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Trend
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<NamedSeries> {
        vec![NamedSeries::new(self.id(), sma(&closes(bars), self.period))]
    }
}
