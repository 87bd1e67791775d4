//! Trend projection, support/resistance and volatility forecasting.

use super::financial::{daily_returns, TRADING_DAYS_PER_YEAR};
use crate::services::signals::indicators::{mean, sample_std};
use crate::types::{SupportResistance, TrendDirection, TrendPrediction, VolatilityForecast};

/// Minimum closes for a trend projection.
pub const MIN_TREND_POINTS: usize = 30;

/// Number of levels kept on each side.
const MAX_LEVELS: usize = 5;

/// Fit a least-squares line to the finite closes and project it forward.
pub fn predict_trend(closes: &[f64], days_ahead: usize) -> Option<TrendPrediction> {
    if closes.len() < MIN_TREND_POINTS || days_ahead == 0 {
        return None;
    }
    let ys: Vec<f64> = closes.iter().copied().filter(|v| v.is_finite()).collect();
    if ys.len() < 10 {
        return None;
    }

    let n = ys.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(&ys);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_tot: f64 = ys.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = ys
        .iter()
        .enumerate()
        .map(|(i, y)| (y - (intercept + slope * i as f64)).powi(2))
        .sum();
    let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };

    let predictions: Vec<f64> = (0..days_ahead)
        .map(|k| intercept + slope * (ys.len() + k) as f64)
        .collect();

    let current_price = *ys.last()?;
    let predicted_price = *predictions.last()?;
    let predicted_change_pct = if current_price != 0.0 {
        (predicted_price / current_price - 1.0) * 100.0
    } else {
        0.0
    };

    Some(TrendPrediction {
        direction: if slope > 0.0 {
            TrendDirection::Bullish
        } else {
            TrendDirection::Bearish
        },
        slope,
        strength: if y_mean != 0.0 {
            slope.abs() / y_mean * 100.0
        } else {
            0.0
        },
        r_squared,
        current_price,
        predicted_price,
        predicted_change_pct,
        days_ahead,
        predictions,
    })
}

/// Local minima and maxima over a `±window` neighbourhood.
///
/// Keeps the five lowest distinct supports (ascending) and the five highest
/// distinct resistances (descending). Requires at least `2 * window` closes.
pub fn support_resistance(closes: &[f64], window: usize) -> SupportResistance {
    let n = closes.len();
    if window == 0 || n < window * 2 {
        return SupportResistance::default();
    }

    let mut support = Vec::new();
    let mut resistance = Vec::new();
    for i in window..n.saturating_sub(window) {
        let neighbourhood = &closes[i - window..=i + window];
        if neighbourhood.iter().any(|v| !v.is_finite()) {
            continue;
        }
        let price = closes[i];
        if neighbourhood.iter().all(|v| price <= *v) {
            support.push(price);
        }
        if neighbourhood.iter().all(|v| price >= *v) {
            resistance.push(price);
        }
    }

    support.sort_by(f64::total_cmp);
    support.dedup();
    support.truncate(MAX_LEVELS);

    resistance.sort_by(|a, b| b.total_cmp(a));
    resistance.dedup();
    resistance.truncate(MAX_LEVELS);

    SupportResistance {
        support,
        resistance,
    }
}

/// Rolling annualized volatility (percent) of daily returns.
///
/// `None` when the closes are shorter than `window` or no full window of
/// returns exists.
pub fn volatility_forecast(closes: &[f64], window: usize) -> Option<VolatilityForecast> {
    if window < 2 || closes.len() < window {
        return None;
    }

    let returns = daily_returns(closes);
    if returns.len() < window {
        return None;
    }

    let scale = TRADING_DAYS_PER_YEAR.sqrt() * 100.0;
    let rolling: Vec<f64> = returns
        .windows(window)
        .filter_map(|w| sample_std(w).map(|s| s * scale))
        .collect();

    let current = *rolling.last()?;
    let average = mean(&rolling);
    let trend = (rolling.len() >= 15).then(|| {
        let recent = &rolling[rolling.len() - 5..];
        let prior = &rolling[rolling.len() - 15..rolling.len() - 5];
        mean(recent) - mean(prior)
    });

    Some(VolatilityForecast {
        current,
        average,
        trend,
        percentile: percentile_rank(&rolling, current),
    })
}

/// Percentile rank of `score` within `values`, averaging ties.
fn percentile_rank(values: &[f64], score: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let below = values.iter().filter(|v| **v < score).count();
    let at_or_below = values.iter().filter(|v| **v <= score).count();
    let ties_bonus = usize::from(at_or_below > below);
    (below + at_or_below + ties_bonus) as f64 * 50.0 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Trend Tests
    // =========================================================================

    #[test]
    fn test_predict_trend_perfect_line() {
        let closes: Vec<f64> = (0..40).map(|i| 10.0 + 0.5 * i as f64).collect();
        let trend = predict_trend(&closes, 30).unwrap();
        assert_eq!(trend.direction, TrendDirection::Bullish);
        assert!((trend.slope - 0.5).abs() < 1e-9);
        assert!((trend.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(trend.predictions.len(), 30);
        // x = 69 on the fitted line
        assert!((trend.predicted_price - 44.5).abs() < 1e-9);
        assert!((trend.current_price - 29.5).abs() < 1e-12);
        let expected_change = (44.5 / 29.5 - 1.0) * 100.0;
        assert!((trend.predicted_change_pct - expected_change).abs() < 1e-9);
    }

    #[test]
    fn test_predict_trend_bearish() {
        let closes: Vec<f64> = (0..35).map(|i| 100.0 - i as f64).collect();
        let trend = predict_trend(&closes, 5).unwrap();
        assert_eq!(trend.direction, TrendDirection::Bearish);
        assert!(trend.strength > 0.0);
    }

    #[test]
    fn test_predict_trend_insufficient_data() {
        let closes: Vec<f64> = (0..29).map(|i| i as f64).collect();
        assert!(predict_trend(&closes, 30).is_none());
    }

    // =========================================================================
    // Support/Resistance Tests
    // =========================================================================

    #[test]
    fn test_support_resistance_levels() {
        let closes = [5.0, 4.0, 3.0, 4.0, 5.0, 6.0, 7.0, 6.0, 5.0, 4.0, 5.0, 6.0, 7.0];
        let levels = support_resistance(&closes, 2);
        assert_eq!(levels.support, vec![3.0, 4.0]);
        assert_eq!(levels.resistance, vec![7.0]);
    }

    #[test]
    fn test_support_resistance_short_series() {
        let levels = support_resistance(&[1.0, 2.0, 3.0], 2);
        assert!(levels.support.is_empty());
        assert!(levels.resistance.is_empty());
    }

    #[test]
    fn test_support_resistance_caps_levels() {
        let closes: Vec<f64> = (0..200)
            .map(|i| 50.0 + (i as f64 * 0.9).sin() * (5.0 + (i % 11) as f64))
            .collect();
        let levels = support_resistance(&closes, 2);
        assert!(levels.support.len() <= 5);
        assert!(levels.resistance.len() <= 5);
        assert!(levels.support.windows(2).all(|w| w[0] < w[1]));
        assert!(levels.resistance.windows(2).all(|w| w[0] > w[1]));
    }

    // =========================================================================
    // Volatility Tests
    // =========================================================================

    #[test]
    fn test_volatility_forecast() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 * (1.0 + 0.01 * (i as f64 * 1.7).sin()))
            .collect();
        let forecast = volatility_forecast(&closes, 30).unwrap();
        assert!(forecast.current > 0.0);
        assert!(forecast.average > 0.0);
        assert!(forecast.trend.is_some());
        assert!((0.0..=100.0).contains(&forecast.percentile));
    }

    #[test]
    fn test_volatility_forecast_insufficient() {
        assert!(volatility_forecast(&[1.0; 10], 30).is_none());
        assert!(volatility_forecast(&[1.0; 30], 30).is_none());
    }

    #[test]
    fn test_percentile_rank() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile_rank(&values, 4.0) - 100.0).abs() < 1e-12);
        assert!((percentile_rank(&values, 2.0) - 50.0).abs() < 1e-12);
        assert_eq!(percentile_rank(&[], 1.0), 0.0);
    }
}
