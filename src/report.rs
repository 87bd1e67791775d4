//! Plain-text rendering of analysis results for the terminal.

use crate::config::Capabilities;
use crate::types::{AnalysisReport, MaPosition, PatternHits, RsiZone, TrendDirection};
use std::fmt::Write;

const RULE_WIDTH: usize = 64;

fn rule(out: &mut String, ch: char) {
    out.push_str(&ch.to_string().repeat(RULE_WIDTH));
    out.push('\n');
}

fn section(out: &mut String, title: &str) {
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    rule(out, '-');
}

fn row(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "  {:<26}{}", label, value);
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn pct(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn money(value: f64) -> String {
    if value.abs() >= 1e9 {
        format!("${:.2}B", value / 1e9)
    } else if value.abs() >= 1e6 {
        format!("${:.2}M", value / 1e6)
    } else {
        format!("${:.2}", value)
    }
}

fn pattern_rows(out: &mut String, patterns: &PatternHits) {
    let named = [
        ("Hammer", &patterns.hammer),
        ("Shooting star", &patterns.shooting_star),
        ("Doji", &patterns.doji),
        ("Bullish engulfing", &patterns.bullish_engulfing),
        ("Bearish engulfing", &patterns.bearish_engulfing),
        ("Golden cross", &patterns.golden_cross),
        ("Death cross", &patterns.death_cross),
    ];
    for (name, dates) in named {
        if let Some(latest) = dates.last() {
            row(out, name, format!("{} (latest {})", dates.len(), latest));
        }
    }
}

/// Render the full terminal report.
pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    rule(&mut out, '=');
    let _ = writeln!(
        out,
        "{}",
        report.display_name.as_deref().unwrap_or(&report.symbol)
    );
    let _ = writeln!(
        out,
        "{} | period {} | {} trading days ({} to {})",
        report.symbol, report.period, report.data_points, report.start_date, report.end_date
    );
    rule(&mut out, '=');

    let price = &report.price;
    section(&mut out, "Price");
    row(&mut out, "Current price", format!("${:.2}", price.current_price));
    if let (Some(change), Some(change_pct)) = (price.change, price.change_pct) {
        row(&mut out, "Change", format!("{:+.2} ({:+.2}%)", change, change_pct));
    }
    row(&mut out, "Previous close", opt(price.previous_close.map(|p| format!("${:.2}", p))));
    row(&mut out, "52-week high", format!("${:.2}", price.high_52w));
    row(&mut out, "52-week low", format!("${:.2}", price.low_52w));
    row(&mut out, "As of", price.as_of);

    section(&mut out, "Technical Indicators");
    if report.indicators.is_empty() {
        row(&mut out, "Indicators", "not enough history");
    }
    for (name, value) in &report.indicators {
        row(&mut out, name, format!("{:.4}", value));
    }

    let signals = &report.signals;
    if signals.rsi.is_some() || signals.price_vs_sma20.is_some() || signals.price_vs_sma50.is_some() {
        section(&mut out, "Signals");
        if let Some(zone) = signals.rsi {
            let text = match zone {
                RsiZone::Overbought => "Overbought (RSI > 70)",
                RsiZone::Oversold => "Oversold (RSI < 30)",
                RsiZone::Neutral => "Neutral",
            };
            row(&mut out, "RSI", text);
        }
        let position = |p: MaPosition| match p {
            MaPosition::Above => "Price above",
            MaPosition::Below => "Price below",
        };
        if let Some(p) = signals.price_vs_sma20 {
            row(&mut out, "SMA 20", position(p));
        }
        if let Some(p) = signals.price_vs_sma50 {
            row(&mut out, "SMA 50", position(p));
        }
    }

    if !report.patterns.is_empty() {
        section(&mut out, "Patterns");
        pattern_rows(&mut out, &report.patterns);
    }

    if let Some(returns) = &report.returns {
        section(&mut out, "Financial Performance");
        row(&mut out, "Total return", pct(returns.total_return));
        row(&mut out, "Annualized return", pct(returns.annualized_return));
        row(&mut out, "Volatility", pct(returns.volatility));
        row(&mut out, "Sharpe ratio", opt(returns.sharpe_ratio.map(|s| format!("{:.2}", s))));
        row(&mut out, "Max drawdown", pct(returns.max_drawdown));
        row(&mut out, "Avg daily return", pct(returns.avg_daily_return));
    }

    if let Some(dividends) = &report.dividends {
        section(&mut out, "Dividends");
        row(&mut out, "Annual dividend", format!("${:.3}", dividends.annual_dividend));
        row(
            &mut out,
            "Current yield",
            opt(dividends.current_yield.map(|y| format!("{:.2}%", y))),
        );
        row(
            &mut out,
            "Growth rate",
            opt(dividends.growth_rate.map(|g| format!("{:.2}%", g))),
        );
        row(&mut out, "Payments per year", format!("{:.1}", dividends.payments_per_year));
        for year in dividends.history.iter().rev().take(5) {
            row(
                &mut out,
                &format!("  {}", year.year),
                format!("${:.3} ({} payments)", year.total, year.count),
            );
        }
    }

    if let Some(company) = &report.company {
        section(&mut out, "Company Information");
        row(&mut out, "Company name", opt(company.name.as_deref()));
        row(&mut out, "Sector", opt(company.sector.as_deref()));
        row(&mut out, "Industry", opt(company.industry.as_deref()));
        row(&mut out, "Market cap", opt(company.market_cap.map(money)));
        row(&mut out, "P/E ratio", opt(company.pe_ratio.map(|v| format!("{:.2}", v))));
        row(&mut out, "Dividend yield", opt(company.dividend_yield.map(pct)));
    }

    if report.trend.is_some() || report.volatility.is_some() || report.support_resistance.is_some() {
        section(&mut out, "Price Predictions");
        if let Some(trend) = &report.trend {
            let direction = match trend.direction {
                TrendDirection::Bullish => "Bullish",
                TrendDirection::Bearish => "Bearish",
            };
            row(&mut out, "Trend direction", direction);
            row(&mut out, "Trend strength", format!("{:.3}%", trend.strength));
            row(&mut out, "R squared", format!("{:.3}", trend.r_squared));
            row(
                &mut out,
                &format!("{}-day prediction", trend.days_ahead),
                format!("${:.2}", trend.predicted_price),
            );
            row(&mut out, "Expected change", format!("{:+.2}%", trend.predicted_change_pct));
        }
        if let Some(levels) = &report.support_resistance {
            let join = |levels: &[f64]| {
                levels
                    .iter()
                    .map(|l| format!("{:.2}", l))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            row(&mut out, "Support", join(&levels.support));
            row(&mut out, "Resistance", join(&levels.resistance));
        }
        if let Some(vol) = &report.volatility {
            row(&mut out, "Volatility (annual)", format!("{:.2}%", vol.current));
            row(&mut out, "Volatility percentile", format!("{:.0}", vol.percentile));
        }
    }

    if let Some(sentiment) = &report.sentiment {
        section(&mut out, "News Sentiment");
        row(&mut out, "Overall", sentiment.label.as_str());
        row(&mut out, "Average score", format!("{:.3}", sentiment.average_compound));
        row(
            &mut out,
            "Articles (+/-/=)",
            format!(
                "{} ({}/{}/{})",
                sentiment.article_count,
                sentiment.positive_count,
                sentiment.negative_count,
                sentiment.neutral_count
            ),
        );
    }

    if !report.news.is_empty() {
        section(&mut out, "Recent News");
        for article in report.news.iter().take(5) {
            let _ = writeln!(
                out,
                "  {} | {} | {}",
                article.published_at.format("%Y-%m-%d"),
                article.source,
                article.title
            );
        }
    }

    out.push('\n');
    let _ = writeln!(
        out,
        "Sources: {} | generated {}",
        report.sources.join(", "),
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out
}

/// Feature availability table for the self-test.
pub fn render_capabilities(capabilities: &Capabilities) -> String {
    let mut out = String::new();
    section(&mut out, "Capabilities");
    for (name, available) in capabilities.table() {
        row(&mut out, name, if available { "available" } else { "not configured" });
    }
    out
}

/// Command reference and usage examples for the self-test.
pub fn render_command_reference() -> String {
    let mut out = String::new();
    section(&mut out, "Commands");
    let commands = [
        ("(no command)", "Analyze AFI for one year"),
        ("analyze --symbol SYM", "Analyze another stock"),
        ("analyze --period P", "Change the lookback period"),
        ("dashboard", "Start the web dashboard"),
        ("self-test", "Check providers and configuration"),
        ("cache-clear [--symbol]", "Drop cached provider data"),
        ("--help", "Show all options"),
    ];
    for (command, description) in commands {
        row(&mut out, command, description);
    }

    section(&mut out, "Examples");
    for example in [
        "stockwatch analyze --symbol CBA",
        "stockwatch analyze --period 6mo --symbol BHP",
        "stockwatch analyze --period max",
        "stockwatch dashboard --port 8501",
    ] {
        let _ = writeln!(out, "  {}", example);
    }
    out.push_str("\n  All fetched data is saved to the SQLite database.\n");
    out.push_str("  Any ASX ticker works; bare tickers get the .AX suffix.\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::{
        CompanyInfo, Period, PriceSummary, ReturnMetrics, TechnicalSignals, TrendPrediction,
    };
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn sample_report() -> AnalysisReport {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let mut indicators = BTreeMap::new();
        indicators.insert("rsi_14".to_string(), 72.5);
        indicators.insert("sma_20".to_string(), 7.1);
        AnalysisReport {
            symbol: "AFI.AX".to_string(),
            display_name: Some("Australian Foundation Investment Company (AFI)".to_string()),
            period: Period::OneYear,
            generated_at: Utc.with_ymd_and_hms(2024, 3, 5, 6, 0, 0).unwrap(),
            data_points: 250,
            start_date: NaiveDate::from_ymd_opt(2023, 3, 6).unwrap(),
            end_date: day,
            price: PriceSummary {
                current_price: 7.25,
                previous_close: Some(7.20),
                change: Some(0.05),
                change_pct: Some(0.694),
                high_52w: 7.60,
                low_52w: 6.80,
                as_of: day,
            },
            indicators,
            signals: TechnicalSignals {
                rsi: Some(RsiZone::Overbought),
                price_vs_sma20: Some(MaPosition::Above),
                price_vs_sma50: None,
            },
            patterns: PatternHits {
                doji: vec![day],
                ..Default::default()
            },
            returns: Some(ReturnMetrics {
                total_return: 0.052,
                annualized_return: 0.0524,
                volatility: 0.11,
                sharpe_ratio: Some(0.29),
                max_drawdown: -0.08,
                avg_daily_return: 0.0002,
                daily_return_std: 0.007,
                trading_days: 249,
            }),
            dividends: None,
            company: Some(CompanyInfo {
                name: Some("Australian Foundation Investment Co".to_string()),
                market_cap: Some(9_100_000_000.0),
                ..CompanyInfo::new("AFI.AX")
            }),
            trend: Some(TrendPrediction {
                direction: TrendDirection::Bullish,
                slope: 0.001,
                strength: 0.014,
                r_squared: 0.4,
                current_price: 7.25,
                predicted_price: 7.40,
                predicted_change_pct: 2.07,
                days_ahead: 30,
                predictions: vec![7.3, 7.4],
            }),
            support_resistance: None,
            volatility: None,
            sentiment: None,
            news: Vec::new(),
            sources: vec!["yahoo".to_string()],
        }
    }

    #[test]
    fn test_render_report_sections() {
        let text = render_report(&sample_report());
        assert!(text.contains("Australian Foundation Investment Company (AFI)"));
        assert!(text.contains("$7.25"));
        assert!(text.contains("+0.05 (+0.69%)"));
        assert!(text.contains("Overbought (RSI > 70)"));
        assert!(text.contains("Doji"));
        assert!(text.contains("5.20%"));
        assert!(text.contains("$9.10B"));
        assert!(text.contains("30-day prediction"));
        assert!(text.contains("Bullish"));
        assert!(!text.contains("News Sentiment"));
        assert!(!text.contains("Dividends"));
    }

    #[test]
    fn test_render_capabilities() {
        let text = render_capabilities(&Capabilities::resolve(&Config::default()));
        assert!(text.contains("Yahoo Finance"));
        assert!(text.contains("available"));
        assert!(text.contains("not configured"));
    }

    #[test]
    fn test_command_reference() {
        let text = render_command_reference();
        assert!(text.contains("analyze --symbol CBA"));
        assert!(text.contains("self-test"));
    }

    #[test]
    fn test_money() {
        assert_eq!(money(9_100_000_000.0), "$9.10B");
        assert_eq!(money(2_500_000.0), "$2.50M");
        assert_eq!(money(12.5), "$12.50");
    }
}
