//! Relative Strength Index (RSI) indicator.

use super::{mean, rolling_opt, undefined, Series};
use crate::services::signals::{Indicator, IndicatorCategory, NamedSeries};
use crate::types::{closes, PriceBar};

/// RSI over trailing simple means of gains and losses.
///
/// Gains and losses are the zero-floored parts of the one-step delta. The
/// first defined index is `window`. A zero loss mean yields 100, including
/// a flat window where the gain mean is zero too.
pub fn rsi(values: &[f64], window: usize) -> Series {
    let n = values.len();
    if window == 0 || n <= window {
        return undefined(n);
    }

    let mut gains = undefined(n);
    let mut losses = undefined(n);
    for i in 1..n {
        let delta = values[i] - values[i - 1];
        if delta.is_finite() {
            gains[i] = Some(delta.max(0.0));
            losses[i] = Some((-delta).max(0.0));
        }
    }

    let avg_gain = rolling_opt(&gains, window, |w| Some(mean(w)));
    let avg_loss = rolling_opt(&losses, window, |w| Some(mean(w)));

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(_), Some(loss)) if loss == 0.0 => Some(100.0),
            (Some(gain), Some(loss)) => Some(100.0 - 100.0 / (1.0 + gain / loss)),
            _ => None,
        })
        .collect()
}

/// RSI of closing prices.
///
/// Values range from 0-100:
/// - Below 30: Oversold
/// - Above 70: Overbought
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Rsi {
    fn id(&self) -> String {
        format!("rsi_{}", self.period)
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<NamedSeries> {
        vec![NamedSeries::new(self.id(), rsi(&closes(bars), self.period))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_first_defined_index() {
        let values: Vec<f64> = (0..20).map(|i| (i as f64).sin() + 10.0).collect();
        let out = rsi(&values, 14);
        assert!(out.iter().take(14).all(|v| v.is_none()));
        assert!(out[14].is_some());
    }

    #[test]
    fn test_rsi_balanced_moves() {
        let out = rsi(&[1.0, 2.0, 1.0, 2.0, 1.0], 2);
        assert!((out[2].unwrap() - 50.0).abs() < 1e-9);
        assert!((out[4].unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_uptrend_is_100() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&values, 14);
        assert_eq!(out[29], Some(100.0));
    }

    #[test]
    fn test_rsi_downtrend_is_zero() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let out = rsi(&values, 14);
        assert_eq!(out[29], Some(0.0));
    }

    #[test]
    fn test_rsi_flat_is_100() {
        let out = rsi(&[5.0; 20], 14);
        assert_eq!(out[19], Some(100.0));
    }

    #[test]
    fn test_rsi_bounded() {
        let values: Vec<f64> = (0..200)
            .map(|i| 50.0 + (i as f64 * 0.37).sin() * 10.0 + (i as f64 * 1.3).cos() * 3.0)
            .collect();
        for v in rsi(&values, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "rsi out of range: {}", v);
        }
    }

    #[test]
    fn test_rsi_under_length() {
        assert_eq!(rsi(&[1.0, 2.0, 3.0], 14), vec![None, None, None]);
    }
}
