//! Momentum and Rate of Change (ROC) indicators.

use super::{undefined, Series};
use crate::services::signals::{Indicator, IndicatorCategory, NamedSeries};
use crate::types::{closes, PriceBar};

/// `x[i] - x[i - window]`, first defined at index `window`.
pub fn momentum(values: &[f64], window: usize) -> Series {
    lagged(values, window, |current, base| Some(current - base))
}

/// `(x[i] - x[i - window]) / x[i - window] * 100`. A zero base is undefined.
pub fn rate_of_change(values: &[f64], window: usize) -> Series {
    lagged(values, window, |current, base| {
        if base == 0.0 {
            None
        } else {
            Some((current - base) / base * 100.0)
        }
    })
}

fn lagged<F>(values: &[f64], window: usize, f: F) -> Series
where
    F: Fn(f64, f64) -> Option<f64>,
{
    let mut out = undefined(values.len());
    if window == 0 {
        return out;
    }
    for i in window..values.len() {
        let (current, base) = (values[i], values[i - window]);
        if current.is_finite() && base.is_finite() {
            out[i] = f(current, base);
        }
    }
    out
}

/// Momentum of closing prices.
pub struct Momentum {
    period: usize,
}

impl Momentum {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Momentum {
    fn id(&self) -> String {
        format!("momentum_{}", self.period)
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<NamedSeries> {
        vec![NamedSeries::new(self.id(), momentum(&closes(bars), self.period))]
    }
}

/// Rate of change of closing prices, in percent.
pub struct RateOfChange {
    period: usize,
}

impl RateOfChange {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for RateOfChange {
    fn id(&self) -> String {
        format!("roc_{}", self.period)
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<NamedSeries> {
        vec![NamedSeries::new(
            self.id(),
            rate_of_change(&closes(bars), self.period),
        )]
    }
}
