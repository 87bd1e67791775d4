//! Exponential Moving Average (EMA) indicator.

use super::{undefined, Series};
use crate::services::signals::{Indicator, IndicatorCategory, NamedSeries};
use crate::types::{closes, PriceBar};

/// Exponentially weighted mean with span `window`.
///
/// Uses adjusted weighting: the value at `t` is the sum of
/// `(1 - alpha)^i * x[t - i]` divided by the sum of the weights, with
/// `alpha = 2 / (window + 1)`. Defined from the first point once the input
/// holds at least `window` points.
pub fn ema(values: &[f64], window: usize) -> Series {
    let values: Vec<Option<f64>> = values.iter().map(|v| Some(*v)).collect();
    ema_opt(&values, window)
}

/// EMA over a series with undefined points.
///
/// Undefined and non-finite points contribute nothing, stay undefined in
/// the output, and still decay the weight of earlier points.
pub(crate) fn ema_opt(values: &[Option<f64>], window: usize) -> Series {
    let mut out = undefined(values.len());
    if window == 0 || values.len() < window {
        return out;
    }

    let alpha = 2.0 / (window as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for (i, value) in values.iter().enumerate() {
        weighted_sum *= decay;
        weight_total *= decay;
        if let Some(x) = value.filter(|x| x.is_finite()) {
            weighted_sum += x;
            weight_total += 1.0;
            out[i] = Some(weighted_sum / weight_total);
        }
    }
    out
}

/// EMA of closing prices.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Ema {
    fn id(&self) -> String {
        format!("ema_{}", self.period)
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Trend
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<NamedSeries> {
        vec![NamedSeries::new(self.id(), ema(&closes(bars), self.period))]
    }
}
