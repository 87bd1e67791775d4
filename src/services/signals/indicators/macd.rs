//! Moving Average Convergence Divergence (MACD) indicator.

use super::ema::{ema, ema_opt};
use super::{undefined, Series};
use crate::services::signals::{Indicator, IndicatorCategory, NamedSeries};
use crate::types::{closes, PriceBar};
use serde::{Deserialize, Serialize};

/// MACD line, signal line and histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub line: Series,
    pub signal: Series,
    pub histogram: Series,
}

impl MacdSeries {
    fn undefined(len: usize) -> Self {
        Self {
            line: undefined(len),
            signal: undefined(len),
            histogram: undefined(len),
        }
    }
}

/// MACD: EMA(fast) - EMA(slow), its EMA(signal), and their difference.
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let n = values.len();
    if fast == 0 || slow == 0 || signal == 0 || n < fast.max(slow) {
        return MacdSeries::undefined(n);
    }

    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);
    let line: Series = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal_line = ema_opt(&line, signal);
    let histogram = line
        .iter()
        .zip(&signal_line)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdSeries {
        line,
        signal: signal_line,
        histogram,
    }
}

/// MACD of closing prices.
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self { fast, slow, signal }
    }
}

impl Indicator for Macd {
    fn id(&self) -> String {
        "macd".to_string()
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Trend
    }

    fn min_periods(&self) -> usize {
        self.fast.max(self.slow)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<NamedSeries> {
        let out = macd(&closes(bars), self.fast, self.slow, self.signal);
        vec![
            NamedSeries::new("macd", out.line),
            NamedSeries::new("macd_signal", out.signal),
            NamedSeries::new("macd_histogram", out.histogram),
        ]
    }
}
