//! SQLite persistence semantics.

use chrono::{Duration, NaiveDate, Utc};
use stockwatch::services::SqliteStore;
use stockwatch::types::{CompanyInfo, DividendEvent, IndicatorValue, NewsArticle, PriceBar};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn store() -> SqliteStore {
    SqliteStore::new_in_memory().unwrap()
}

#[test]
fn test_dividend_first_write_wins() {
    let store = store();
    assert_eq!(
        store.save_dividends("AFI.AX", &[DividendEvent::new(date(2024, 3, 1), 0.14)]),
        1
    );
    assert_eq!(
        store.save_dividends("AFI.AX", &[DividendEvent::new(date(2024, 3, 1), 0.20)]),
        0
    );

    let stored = store.get_dividends("AFI.AX", None);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].amount, 0.14);
}

#[test]
fn test_price_upsert_is_idempotent() {
    let store = store();
    let first = PriceBar::new(date(2024, 3, 4), 7.10, 7.20, 7.05, 7.15).with_volume(500_000);
    let second = PriceBar::new(date(2024, 3, 4), 9.0, 9.0, 9.0, 9.0);

    assert_eq!(store.save_stock_prices("AFI.AX", &[first.clone()]), 1);
    assert_eq!(store.save_stock_prices("AFI.AX", &[second]), 0);

    let bars = store.get_stock_prices("AFI.AX", None, None);
    assert_eq!(bars, vec![first]);
}

#[test]
fn test_prices_sorted_and_ranged() {
    let store = store();
    let bars: Vec<PriceBar> = [5, 1, 4]
        .iter()
        .map(|d| PriceBar::new(date(2024, 3, *d), 1.0, 1.0, 1.0, *d as f64))
        .collect();
    assert_eq!(store.save_stock_prices("CBA.AX", &bars), 3);

    let all = store.get_stock_prices("CBA.AX", None, None);
    let days: Vec<NaiveDate> = all.iter().map(|b| b.date).collect();
    assert_eq!(days, vec![date(2024, 3, 1), date(2024, 3, 4), date(2024, 3, 5)]);

    let ranged = store.get_stock_prices("CBA.AX", Some(date(2024, 3, 2)), Some(date(2024, 3, 4)));
    assert_eq!(ranged.len(), 1);
    assert_eq!(store.get_latest_price("CBA.AX").unwrap().date, date(2024, 3, 5));
    assert!(store.get_stock_prices("BHP.AX", None, None).is_empty());
}

#[test]
fn test_non_finite_rows_are_skipped() {
    let store = store();
    let bars = vec![
        PriceBar::new(date(2024, 3, 1), 1.0, 1.0, 1.0, f64::NAN),
        PriceBar::new(date(2024, 3, 4), 1.0, 1.0, 1.0, 1.0),
    ];
    assert_eq!(store.save_stock_prices("AFI.AX", &bars), 1);
}

#[test]
fn test_company_info_merges_non_null_fields() {
    let store = store();
    let mut first = CompanyInfo::new("AFI.AX");
    first.sector = Some("Financial Services".to_string());
    first.pe_ratio = Some(28.0);
    store.save_company_info(&first).unwrap();

    let mut update = CompanyInfo::new("AFI.AX");
    update.pe_ratio = Some(30.5);
    update.market_cap = Some(9.1e9);
    store.save_company_info(&update).unwrap();

    let stored = store.get_company_info("AFI.AX").unwrap();
    assert_eq!(stored.sector.as_deref(), Some("Financial Services"));
    assert_eq!(stored.pe_ratio, Some(30.5));
    assert_eq!(stored.market_cap, Some(9.1e9));
}

#[test]
fn test_indicator_values_replace() {
    let store = store();
    let value = |v: f64| IndicatorValue {
        date: date(2024, 3, 5),
        name: "rsi_14".to_string(),
        value: v,
    };
    store.save_indicator_values("AFI.AX", &[value(55.0)]);
    store.save_indicator_values("AFI.AX", &[value(61.0)]);

    let stored = store.get_indicator_values("AFI.AX", "rsi_14", 10);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].value, 61.0);
}

#[test]
fn test_recent_news_window() {
    let store = store();
    let now = Utc::now();
    let article = |url: &str, age_days: i64| NewsArticle {
        title: format!("Story {}", url),
        url: url.to_string(),
        source: "Test".to_string(),
        published_at: now - Duration::days(age_days),
        description: None,
        symbol: Some("AFI.AX".to_string()),
        sentiment: None,
    };
    let saved = store.save_news_articles(&[
        article("https://a", 1),
        article("https://b", 3),
        article("https://c", 40),
        article("https://a", 1),
    ]);
    assert_eq!(saved, 3);

    let recent = store.get_recent_news("AFI.AX", 7, 10);
    let urls: Vec<&str> = recent.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(urls, vec!["https://a", "https://b"]);
}

#[test]
fn test_database_stats_and_statistics() {
    let store = store();
    let bars: Vec<PriceBar> = (0..10)
        .map(|i| {
            let close = 7.0 + i as f64 * 0.1;
            PriceBar::new(date(2024, 3, 1) + Duration::days(i), close, close, close, close)
                .with_volume(1_000)
        })
        .collect();
    store.save_stock_prices("AFI.AX", &bars);
    store.save_dividends("AFI.AX", &[DividendEvent::new(date(2024, 3, 1), 0.14)]);

    let stats = store.database_stats();
    assert_eq!(stats.stock_prices, 10);
    assert_eq!(stats.dividends, 1);
    assert_eq!(stats.symbols, 1);

    let summary = store.price_statistics("AFI.AX", 365).unwrap();
    assert_eq!(summary.count, 10);
    assert!((summary.min_close - 7.0).abs() < 1e-9);
    assert!((summary.max_close - 7.9).abs() < 1e-9);
    assert!(store.price_statistics("CBA.AX", 365).is_none());

    store.optimize().unwrap();
}
