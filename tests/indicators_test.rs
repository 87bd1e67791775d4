//! Indicator and pattern behaviour over realistic series.

use chrono::{Duration, NaiveDate};
use stockwatch::services::analytics::{max_drawdown, return_metrics};
use stockwatch::services::signals::indicators::{
    atr, bollinger, ema, macd, momentum, rate_of_change, rsi, sma, stochastic, williams_r,
};
use stockwatch::services::signals::{detect_patterns, IndicatorSet, MAX_PATTERN_SCAN};
use stockwatch::types::PriceBar;

fn approx(a: Option<f64>, b: f64) -> bool {
    a.map(|a| (a - b).abs() < 1e-2).unwrap_or(false)
}

fn wave(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 50.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.05)
        .collect()
}

fn bars_from(closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| {
            PriceBar::new(start + Duration::days(i as i64), c - 0.2, c + 0.5, c - 0.5, *c)
                .with_volume(10_000)
        })
        .collect()
}

// =============================================================================
// Worked examples
// =============================================================================

#[test]
fn test_sma_worked_example() {
    let out = sma(&[10.0, 11.0, 12.0, 11.0, 10.0], 3);
    assert_eq!(out.len(), 5);
    assert!(out[0].is_none() && out[1].is_none());
    assert!(approx(out[2], 11.0));
    assert!(approx(out[3], 11.33));
    assert!(approx(out[4], 11.0));
}

#[test]
fn test_momentum_worked_example() {
    let out = momentum(&[10.0, 11.0, 12.0, 11.0, 10.0], 1);
    assert_eq!(out, vec![None, Some(1.0), Some(1.0), Some(-1.0), Some(-1.0)]);
}

// =============================================================================
// Length and definedness
// =============================================================================

#[test]
fn test_under_length_input_is_all_undefined() {
    let values = [1.0, 2.0, 3.0];
    let all_none = |s: &[Option<f64>]| s.len() == 3 && s.iter().all(Option::is_none);

    assert!(all_none(&sma(&values, 5)));
    assert!(all_none(&ema(&values, 5)));
    assert!(all_none(&rsi(&values, 14)));
    assert!(all_none(&momentum(&values, 3)));
    assert!(all_none(&rate_of_change(&values, 3)));
    assert!(all_none(&bollinger(&values, 20, 2.0).middle));
    assert!(all_none(&macd(&values, 12, 26, 9).line));
    assert!(all_none(&atr(&values, &values, &values, 14)));
    assert!(all_none(&williams_r(&values, &values, &values, 14)));
    assert!(all_none(&stochastic(&values, &values, &values, 14, 3).k));
}

#[test]
fn test_empty_input() {
    assert!(sma(&[], 3).is_empty());
    assert!(rsi(&[], 14).is_empty());
    assert!(IndicatorSet::compute_default(&[]).latest_values().is_empty());
}

#[test]
fn test_sma_of_constant_series() {
    let out = sma(&[4.2; 30], 7);
    assert!(out.iter().skip(6).all(|v| approx(*v, 4.2)));
}

// =============================================================================
// Bounds
// =============================================================================

#[test]
fn test_rsi_bounded() {
    let out = rsi(&wave(200), 14);
    let defined: Vec<f64> = out.iter().flatten().copied().collect();
    assert!(!defined.is_empty());
    assert!(defined.iter().all(|v| (0.0..=100.0).contains(v)));
}

#[test]
fn test_rsi_without_losses_is_100() {
    let rising: Vec<f64> = (0..30).map(|i| i as f64).collect();
    let out = rsi(&rising, 14);
    assert_eq!(out[29], Some(100.0));
}

#[test]
fn test_bollinger_ordering() {
    let bands = bollinger(&wave(120), 20, 2.0);
    for i in 0..120 {
        if let (Some(u), Some(m), Some(l)) = (bands.upper[i], bands.middle[i], bands.lower[i]) {
            assert!(u >= m && m >= l, "bands out of order at {}", i);
        }
    }
}

#[test]
fn test_stochastic_flat_range_is_undefined() {
    let flat = [5.0; 20];
    let out = stochastic(&flat, &flat, &flat, 14, 3);
    assert!(out.k.iter().all(Option::is_none));
    assert!(out.d.iter().all(Option::is_none));
}

// =============================================================================
// Scalar summaries
// =============================================================================

#[test]
fn test_return_metrics_on_doubling() {
    let closes = [10.0, 12.5, 20.0];
    let metrics = return_metrics(&closes).unwrap();
    assert!((metrics.total_return - 1.0).abs() < 1e-9);
    assert_eq!(metrics.trading_days, 2);
    assert!(metrics.sharpe_ratio.is_some());
    assert_eq!(max_drawdown(&closes), 0.0);
}

#[test]
fn test_return_metrics_flat_has_no_sharpe() {
    let metrics = return_metrics(&[10.0; 10]).unwrap();
    assert_eq!(metrics.volatility, 0.0);
    assert!(metrics.sharpe_ratio.is_none());
}

#[test]
fn test_max_drawdown() {
    let dd = max_drawdown(&[100.0, 120.0, 90.0, 110.0]);
    assert!((dd - (-0.25)).abs() < 1e-9);
}

// =============================================================================
// Indicator set and patterns
// =============================================================================

#[test]
fn test_indicator_set_aligned_with_bars() {
    let bars = bars_from(&wave(260));
    let set = IndicatorSet::compute_default(&bars);
    assert_eq!(set.dates.len(), bars.len());
    assert!(set.series.iter().all(|s| s.values.len() == bars.len()));

    let latest = set.latest_values();
    for name in ["sma_20", "sma_50", "sma_200", "ema_12", "rsi_14", "macd", "bb_upper", "atr_14"] {
        assert!(latest.contains_key(name), "missing {}", name);
    }
}

#[test]
fn test_patterns_need_history() {
    let bars = bars_from(&wave(40));
    assert!(detect_patterns(&bars, MAX_PATTERN_SCAN).is_empty());
}

#[test]
fn test_patterns_within_scan_window() {
    let bars = bars_from(&wave(300));
    let hits = detect_patterns(&bars, MAX_PATTERN_SCAN);
    let cutoff = bars[bars.len() - MAX_PATTERN_SCAN].date;
    let all_dates = hits
        .hammer
        .iter()
        .chain(&hits.shooting_star)
        .chain(&hits.doji)
        .chain(&hits.golden_cross)
        .chain(&hits.death_cross);
    for date in all_dates {
        assert!(*date >= cutoff);
    }
}
