//! Average True Range (ATR) indicator.

use super::{mean, rolling_opt, undefined, Series};
use crate::services::signals::{Indicator, IndicatorCategory, NamedSeries};
use crate::types::{closes, highs, lows, PriceBar};

/// True range per bar.
///
/// The first bar has no previous close, so its true range is `high - low`.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Series {
    let n = close.len();
    if high.len() != n || low.len() != n {
        return undefined(n);
    }

    (0..n)
        .map(|i| {
            let span = high[i] - low[i];
            let tr = if i == 0 {
                span
            } else {
                let prev_close = close[i - 1];
                span.max((high[i] - prev_close).abs())
                    .max((low[i] - prev_close).abs())
            };
            Some(tr).filter(|v| v.is_finite())
        })
        .collect()
}

/// Trailing mean of the true range over `window` bars.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], window: usize) -> Series {
    rolling_opt(&true_range(high, low, close), window, |w| Some(mean(w)))
}

/// ATR over high/low/close.
pub struct Atr {
    period: usize,
}

impl Default for Atr {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Atr {
    fn id(&self) -> String {
        format!("atr_{}", self.period)
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Volatility
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<NamedSeries> {
        let out = atr(&highs(bars), &lows(bars), &closes(bars), self.period);
        vec![NamedSeries::new(self.id(), out)]
    }
}
