//! Williams %R indicator.

use super::{max, min, undefined, Series};
use crate::services::signals::{Indicator, IndicatorCategory, NamedSeries};
use crate::types::{closes, highs, lows, PriceBar};

/// Williams %R: `-100 * (highest high - close) / (highest high - lowest low)`.
///
/// Ranges from -100 (close at the low) to 0 (close at the high). A window
/// without range is undefined.
pub fn williams_r(high: &[f64], low: &[f64], close: &[f64], window: usize) -> Series {
    let n = close.len();
    let mut out = undefined(n);
    if high.len() != n || low.len() != n || window == 0 || n < window {
        return out;
    }

    for i in (window - 1)..n {
        let start = i + 1 - window;
        let window_high = &high[start..=i];
        let window_low = &low[start..=i];
        if !close[i].is_finite()
            || !window_high.iter().chain(window_low).all(|v| v.is_finite())
        {
            continue;
        }

        let highest = max(window_high);
        let range = highest - min(window_low);
        if range != 0.0 {
            out[i] = Some(-100.0 * (highest - close[i]) / range);
        }
    }
    out
}

/// Williams %R over high/low/close.
pub struct WilliamsR {
    period: usize,
}

impl Default for WilliamsR {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl WilliamsR {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for WilliamsR {
    fn id(&self) -> String {
        format!("williams_r_{}", self.period)
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<NamedSeries> {
        let out = williams_r(&highs(bars), &lows(bars), &closes(bars), self.period);
        vec![NamedSeries::new(self.id(), out)]
    }
}
