//! Return, risk and dividend metrics.

use crate::services::signals::indicators::{mean, sample_std};
use crate::types::{DividendEvent, DividendMetrics, ReturnMetrics, YearlyDividend};
use chrono::Datelike;
use std::collections::BTreeMap;

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annual risk-free rate used in the Sharpe ratio.
pub const RISK_FREE_RATE: f64 = 0.02;

/// Simple daily returns, one shorter than the input.
///
/// Steps from a zero or non-finite close are skipped.
pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter_map(|w| {
            let r = (w[1] - w[0]) / w[0];
            (w[0] != 0.0 && r.is_finite()).then_some(r)
        })
        .collect()
}

/// Most negative decline from a running peak of the cumulative return
/// curve, as a fraction (e.g. -0.25). Zero for a series that never falls.
pub fn max_drawdown(closes: &[f64]) -> f64 {
    let mut cumulative = 1.0;
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;
    for r in daily_returns(closes) {
        cumulative *= 1.0 + r;
        peak = peak.max(cumulative);
        worst = worst.min(cumulative / peak - 1.0);
    }
    worst
}

/// Return and risk summary. `None` for fewer than two usable closes.
pub fn return_metrics(closes: &[f64]) -> Option<ReturnMetrics> {
    let returns = daily_returns(closes);
    if returns.is_empty() {
        return None;
    }

    let total_return = returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0;
    let annualized_return = total_return * (TRADING_DAYS_PER_YEAR / returns.len() as f64);
    let daily_return_std = sample_std(&returns).unwrap_or(0.0);
    let volatility = daily_return_std * TRADING_DAYS_PER_YEAR.sqrt();
    let sharpe_ratio = (volatility > 0.0).then(|| (annualized_return - RISK_FREE_RATE) / volatility);

    Some(ReturnMetrics {
        total_return,
        annualized_return,
        volatility,
        sharpe_ratio,
        max_drawdown: max_drawdown(closes),
        avg_daily_return: mean(&returns),
        daily_return_std,
        trading_days: returns.len(),
    })
}

/// Dividend summary. `None` when there are no dividends.
///
/// The annual figure is the total of the latest calendar year with a
/// payment. Yield is omitted without a positive current price and growth
/// needs at least two years.
pub fn dividend_metrics(dividends: &[DividendEvent], current_price: Option<f64>) -> Option<DividendMetrics> {
    if dividends.is_empty() {
        return None;
    }

    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for dividend in dividends {
        let entry = by_year.entry(dividend.ex_date.year()).or_insert((0.0, 0));
        entry.0 += dividend.amount;
        entry.1 += 1;
    }

    let history: Vec<YearlyDividend> = by_year
        .into_iter()
        .map(|(year, (total, count))| YearlyDividend { year, total, count })
        .collect();

    let annual_dividend = history.last().map(|y| y.total).unwrap_or(0.0);
    let current_yield = current_price
        .filter(|p| *p > 0.0)
        .map(|p| annual_dividend / p * 100.0);

    let growth: Vec<f64> = history
        .windows(2)
        .filter(|w| w[0].total != 0.0)
        .map(|w| (w[1].total / w[0].total - 1.0) * 100.0)
        .collect();
    let growth_rate = (!growth.is_empty()).then(|| mean(&growth));

    Some(DividendMetrics {
        annual_dividend,
        current_yield,
        growth_rate,
        payments_per_year: dividends.len() as f64 / history.len() as f64,
        total_paid: dividends.iter().map(|d| d.amount).sum(),
        history,
    })
}
