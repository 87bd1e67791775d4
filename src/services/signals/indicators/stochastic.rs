//! Stochastic Oscillator indicator.

use super::{max, mean, min, rolling_opt, undefined, Series};
use crate::services::signals::{Indicator, IndicatorCategory, NamedSeries};
use crate::types::{closes, highs, lows, PriceBar};
use serde::{Deserialize, Serialize};

/// %K and %D series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StochasticSeries {
    pub k: Series,
    pub d: Series,
}

/// Stochastic %K over `k_window` bars and its SMA(`d_window`) as %D.
///
/// A window whose highest high equals its lowest low has no range, so %K
/// is undefined there, as is every %D window containing it. Mismatched
/// input lengths yield all-undefined output sized to `close`.
pub fn stochastic(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    k_window: usize,
    d_window: usize,
) -> StochasticSeries {
    let n = close.len();
    let mut k = undefined(n);
    if high.len() != n || low.len() != n || k_window == 0 || n < k_window {
        return StochasticSeries {
            k,
            d: undefined(n),
        };
    }

    for i in (k_window - 1)..n {
        let start = i + 1 - k_window;
        let window_high = &high[start..=i];
        let window_low = &low[start..=i];
        if !close[i].is_finite()
            || !window_high.iter().chain(window_low).all(|v| v.is_finite())
        {
            continue;
        }

        let highest = max(window_high);
        let lowest = min(window_low);
        let range = highest - lowest;
        if range != 0.0 {
            k[i] = Some(100.0 * (close[i] - lowest) / range);
        }
    }

    let d = rolling_opt(&k, d_window, |w| Some(mean(w)));
    StochasticSeries { k, d }
}

/// Stochastic Oscillator over high/low/close.
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
}

impl Default for Stochastic {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
        }
    }
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Self {
        Self { k_period, d_period }
    }
}

impl Indicator for Stochastic {
    fn id(&self) -> String {
        "stoch".to_string()
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_periods(&self) -> usize {
        self.k_period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<NamedSeries> {
        let out = stochastic(
            &highs(bars),
            &lows(bars),
            &closes(bars),
            self.k_period,
            self.d_period,
        );
        vec![
            NamedSeries::new("stoch_k", out.k),
            NamedSeries::new("stoch_d", out.d),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stochastic_known_values() {
        let high = [10.0, 12.0, 11.0, 13.0];
        let low = [8.0, 9.0, 9.5, 10.0];
        let close = [9.0, 11.0, 10.0, 12.5];
        let out = stochastic(&high, &low, &close, 2, 2);

        assert_eq!(out.k[0], None);
        // window [0,1]: hh 12, ll 8 => 100 * 3 / 4
        assert!((out.k[1].unwrap() - 75.0).abs() < 1e-12);
        // window [1,2]: hh 12, ll 9 => 100 * 1 / 3
        assert!((out.k[2].unwrap() - 100.0 / 3.0).abs() < 1e-12);
        // window [2,3]: hh 13, ll 9.5 => 100 * 3 / 3.5
        assert!((out.k[3].unwrap() - 300.0 / 3.5).abs() < 1e-12);

        assert_eq!(out.d[1], None);
        let expected_d = (75.0 + 100.0 / 3.0) / 2.0;
        assert!((out.d[2].unwrap() - expected_d).abs() < 1e-12);
    }

    #[test]
    fn test_stochastic_flat_window_undefined() {
        let flat = [5.0; 6];
        let out = stochastic(&flat, &flat, &flat, 3, 2);
        assert!(out.k.iter().all(|v| v.is_none()));
        assert!(out.d.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_stochastic_bounded_for_consistent_bars() {
        let close: Vec<f64> = (0..60).map(|i| 50.0 + (i as f64 * 0.4).sin() * 5.0).collect();
        let high: Vec<f64> = close.iter().map(|c| c + 1.0).collect();
        let low: Vec<f64> = close.iter().map(|c| c - 1.0).collect();
        let out = stochastic(&high, &low, &close, 14, 3);
        for v in out.k.iter().chain(out.d.iter()).flatten() {
            assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn test_stochastic_under_length_and_mismatch() {
        let out = stochastic(&[1.0; 5], &[1.0; 5], &[1.0; 5], 14, 3);
        assert_eq!(out.k.len(), 5);
        assert!(out.k.iter().all(|v| v.is_none()));

        let out = stochastic(&[1.0; 3], &[1.0; 5], &[1.0; 5], 2, 2);
        assert_eq!(out.k.len(), 5);
        assert!(out.k.iter().all(|v| v.is_none()));
    }
}
