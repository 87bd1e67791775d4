//! Bollinger Bands indicator.

use super::{rolling, sample_std, sma, Series};
use crate::services::signals::{Indicator, IndicatorCategory, NamedSeries};
use crate::types::{closes, PriceBar};
use serde::{Deserialize, Serialize};

/// Upper, middle and lower band series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
}

/// Bands at `k` sample standard deviations around SMA(`window`).
///
/// A window of one has no sample deviation, so only the middle band is
/// defined there.
pub fn bollinger(values: &[f64], window: usize, k: f64) -> BollingerBands {
    let middle = sma(values, window);
    let deviation = rolling(values, window, sample_std);

    let band = |sign: f64| -> Series {
        middle
            .iter()
            .zip(&deviation)
            .map(|(m, d)| Some((*m)? + sign * k * (*d)?))
            .collect()
    };

    BollingerBands {
        upper: band(1.0),
        lower: band(-1.0),
        middle,
    }
}

/// Bollinger Bands of closing prices.
pub struct Bollinger {
    period: usize,
    std_dev: f64,
}

impl Default for Bollinger {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev: 2.0,
        }
    }
}

impl Bollinger {
    pub fn new(period: usize, std_dev: f64) -> Self {
        Self { period, std_dev }
    }
}

impl Indicator for Bollinger {
    fn id(&self) -> String {
        "bb".to_string()
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Volatility
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<NamedSeries> {
        let bands = bollinger(&closes(bars), self.period, self.std_dev);
        vec![
            NamedSeries::new("bb_upper", bands.upper),
            NamedSeries::new("bb_middle", bands.middle),
            NamedSeries::new("bb_lower", bands.lower),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bollinger_known_values() {
        let bands = bollinger(&[1.0, 2.0, 3.0], 3, 2.0);
        assert_eq!(bands.middle[2], Some(2.0));
        assert!((bands.upper[2].unwrap() - 4.0).abs() < 1e-12);
        assert!((bands.lower[2].unwrap() - 0.0).abs() < 1e-12);
        assert_eq!(bands.upper[1], None);
    }

    #[test]
    fn test_bollinger_band_ordering() {
        let values: Vec<f64> = (0..120)
            .map(|i| 30.0 + (i as f64 * 0.21).sin() * 4.0 + (i % 7) as f64 * 0.3)
            .collect();
        for k in [0.0, 1.0, 2.0, 3.5] {
            let bands = bollinger(&values, 20, k);
            for i in 19..values.len() {
                let (u, m, l) = (
                    bands.upper[i].unwrap(),
                    bands.middle[i].unwrap(),
                    bands.lower[i].unwrap(),
                );
                assert!(u >= m && m >= l, "ordering violated at {}", i);
            }
        }
    }

    #[test]
    fn test_bollinger_constant_series_collapses() {
        let bands = bollinger(&[3.0; 25], 20, 2.0);
        assert_eq!(bands.upper[24], Some(3.0));
        assert_eq!(bands.lower[24], Some(3.0));
    }

    #[test]
    fn test_bollinger_under_length() {
        let bands = bollinger(&[1.0; 5], 20, 2.0);
        assert!(bands.upper.iter().all(|v| v.is_none()));
        assert!(bands.middle.iter().all(|v| v.is_none()));
        assert!(bands.lower.iter().all(|v| v.is_none()));
    }
}
