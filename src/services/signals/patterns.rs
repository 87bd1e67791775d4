//! Candlestick and moving-average crossover pattern detection.

use super::indicators::sma;
use crate::types::{closes, PatternHits, PriceBar};

/// Default bound on the number of bars scanned.
pub const MAX_PATTERN_SCAN: usize = 100;

/// Minimum history before any pattern is reported.
pub const MIN_PATTERN_BARS: usize = 50;

const FAST_MA: usize = 50;
const SLOW_MA: usize = 200;

/// Scan the most recent `lookback` bars for candle shapes and 50/200
/// crossovers.
///
/// Each bar is compared with its predecessor, so the first bar of the
/// history is never a hit. Histories shorter than [`MIN_PATTERN_BARS`]
/// report nothing.
pub fn detect_patterns(bars: &[PriceBar], lookback: usize) -> PatternHits {
    let mut hits = PatternHits::default();
    let n = bars.len();
    if n < MIN_PATTERN_BARS || lookback == 0 {
        return hits;
    }

    let closes = closes(bars);
    let fast = sma(&closes, FAST_MA);
    let slow = sma(&closes, SLOW_MA);

    let start = n.saturating_sub(lookback).max(1);
    for i in start..n {
        let bar = &bars[i];
        let prev = &bars[i - 1];
        let body = bar.body();
        let upper = bar.upper_shadow();
        let lower = bar.lower_shadow();

        if lower > 2.0 * body && upper < 0.1 * body {
            hits.hammer.push(bar.date);
        }
        if upper > 2.0 * body && lower < 0.1 * body {
            hits.shooting_star.push(bar.date);
        }
        if body < 0.1 * bar.range() {
            hits.doji.push(bar.date);
        }

        if prev.is_bearish()
            && bar.is_bullish()
            && bar.open <= prev.close
            && bar.close >= prev.open
            && body > prev.body()
        {
            hits.bullish_engulfing.push(bar.date);
        }
        if prev.is_bullish()
            && bar.is_bearish()
            && bar.open >= prev.close
            && bar.close <= prev.open
            && body > prev.body()
        {
            hits.bearish_engulfing.push(bar.date);
        }

        if let (Some(f0), Some(s0), Some(f1), Some(s1)) = (fast[i - 1], slow[i - 1], fast[i], slow[i])
        {
            if f0 <= s0 && f1 > s1 {
                hits.golden_cross.push(bar.date);
            }
            if f0 >= s0 && f1 < s1 {
                hits.death_cross.push(bar.date);
            }
        }
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn day(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 3).unwrap() + Duration::days(i as i64)
    }

    /// Bars with a clear body and balanced shadows.
    fn plain_bars(count: usize) -> Vec<PriceBar> {
        (0..count)
            .map(|i| {
                let base = 100.0 + (i % 5) as f64;
                PriceBar::new(day(i), base, base + 1.6, base - 0.6, base + 1.0)
            })
            .collect()
    }

    fn closes_to_bars(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(day(i), c - 0.5, c + 0.3, c - 0.8, c))
            .collect()
    }

    #[test]
    fn test_short_history_reports_nothing() {
        let mut bars = plain_bars(49);
        bars[48] = PriceBar::new(day(48), 100.0, 100.05, 97.0, 100.1);
        assert!(detect_patterns(&bars, MAX_PATTERN_SCAN).is_empty());
    }

    #[test]
    fn test_plain_bars_have_no_candle_patterns() {
        let hits = detect_patterns(&plain_bars(80), MAX_PATTERN_SCAN);
        assert!(hits.hammer.is_empty());
        assert!(hits.shooting_star.is_empty());
        assert!(hits.doji.is_empty());
    }

    #[test]
    fn test_hammer_detected() {
        let mut bars = plain_bars(60);
        // body 0.5, lower shadow 3.0, upper shadow 0.0
        bars[55] = PriceBar::new(day(55), 100.0, 100.5, 97.0, 100.5);
        let hits = detect_patterns(&bars, MAX_PATTERN_SCAN);
        assert_eq!(hits.hammer, vec![day(55)]);
        assert!(hits.shooting_star.is_empty());
    }

    #[test]
    fn test_shooting_star_detected() {
        let mut bars = plain_bars(60);
        // body 0.5, upper shadow 3.0, lower shadow 0.0
        bars[57] = PriceBar::new(day(57), 100.5, 103.5, 100.0, 100.0);
        let hits = detect_patterns(&bars, MAX_PATTERN_SCAN);
        assert_eq!(hits.shooting_star, vec![day(57)]);
        assert!(hits.hammer.is_empty());
    }

    #[test]
    fn test_doji_detected() {
        let mut bars = plain_bars(60);
        bars[52] = PriceBar::new(day(52), 100.0, 102.0, 98.0, 100.1);
        let hits = detect_patterns(&bars, MAX_PATTERN_SCAN);
        assert_eq!(hits.doji, vec![day(52)]);
    }

    #[test]
    fn test_engulfing_detected() {
        let mut bars = plain_bars(60);
        bars[50] = PriceBar::new(day(50), 101.0, 101.2, 99.8, 100.0);
        bars[51] = PriceBar::new(day(51), 99.5, 102.0, 99.0, 101.5);
        bars[53] = PriceBar::new(day(53), 100.0, 101.2, 99.8, 101.0);
        bars[54] = PriceBar::new(day(54), 101.5, 102.0, 98.8, 99.0);
        let hits = detect_patterns(&bars, MAX_PATTERN_SCAN);
        assert!(hits.bullish_engulfing.contains(&day(51)));
        assert!(hits.bearish_engulfing.contains(&day(54)));
    }

    #[test]
    fn test_golden_and_death_cross() {
        // Long decline then a sharp rally puts SMA50 above SMA200, then a
        // crash pulls it back under.
        let mut closes: Vec<f64> = (0..200).map(|i| 200.0 - i as f64 * 0.5).collect();
        closes.extend((0..60).map(|i| 100.0 + i as f64 * 5.0));
        closes.extend((0..70).map(|i| 395.0 - i as f64 * 5.0));
        let bars = closes_to_bars(&closes);

        let hits = detect_patterns(&bars, bars.len());
        assert_eq!(hits.golden_cross.len(), 1);
        assert_eq!(hits.death_cross.len(), 1);
        assert!(hits.golden_cross[0] < hits.death_cross[0]);
    }

    #[test]
    fn test_scan_is_bounded_to_recent_bars() {
        let mut bars = plain_bars(150);
        bars[20] = PriceBar::new(day(20), 100.0, 102.0, 98.0, 100.1);
        bars[140] = PriceBar::new(day(140), 100.0, 102.0, 98.0, 100.1);
        let hits = detect_patterns(&bars, MAX_PATTERN_SCAN);
        assert_eq!(hits.doji, vec![day(140)]);
    }
}
