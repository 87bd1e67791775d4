//! SQLite persistence for market data.
//!
//! Prices, dividends, company fundamentals, computed indicator values and
//! news articles survive cache expiry and restarts here. Price and dividend
//! rows are immutable once written: a second write for the same key is
//! ignored.

use crate::types::{
    CompanyInfo, DividendEvent, IndicatorValue, NewsArticle, PriceBar, SentimentScore,
};
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite store for persistent market data.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite store initialized");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub fn new_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    /// A poisoned lock still guards a usable connection.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<(), rusqlite::Error> {
        let conn = self.lock();

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS stock_prices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                adj_close REAL,
                volume INTEGER,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(symbol, date)
            );

            CREATE TABLE IF NOT EXISTS dividends (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                ex_date TEXT NOT NULL,
                amount REAL NOT NULL,
                payment_date TEXT,
                dividend_type TEXT,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(symbol, ex_date)
            );

            CREATE TABLE IF NOT EXISTS company_info (
                symbol TEXT PRIMARY KEY,
                name TEXT,
                sector TEXT,
                industry TEXT,
                market_cap REAL,
                enterprise_value REAL,
                pe_ratio REAL,
                pb_ratio REAL,
                dividend_yield REAL,
                payout_ratio REAL,
                beta REAL,
                shares_outstanding REAL,
                float_shares REAL,
                week_52_high REAL,
                week_52_low REAL,
                currency TEXT,
                exchange TEXT,
                description TEXT,
                website TEXT,
                employees INTEGER,
                updated_at TEXT
            );

            CREATE TABLE IF NOT EXISTS technical_indicators (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                indicator_name TEXT NOT NULL,
                value REAL NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(symbol, date, indicator_name)
            );

            CREATE TABLE IF NOT EXISTS news_articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT,
                title TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                source TEXT NOT NULL,
                description TEXT,
                published_at TEXT NOT NULL,
                sentiment_compound REAL,
                sentiment_positive REAL,
                sentiment_negative REAL,
                sentiment_neutral REAL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_stock_prices_symbol_date
                ON stock_prices(symbol, date);
            CREATE INDEX IF NOT EXISTS idx_dividends_symbol_date
                ON dividends(symbol, ex_date);
            CREATE INDEX IF NOT EXISTS idx_indicators_symbol_date
                ON technical_indicators(symbol, date);
            CREATE INDEX IF NOT EXISTS idx_news_symbol_published
                ON news_articles(symbol, published_at DESC);",
        )?;

        info!("SQLite schema initialized");
        Ok(())
    }

    // ========== Price Methods ==========

    /// Insert daily bars, ignoring dates already stored for the symbol.
    /// Returns the number of new rows.
    pub fn save_stock_prices(&self, symbol: &str, bars: &[PriceBar]) -> usize {
        let mut conn = self.lock();
        let tx = match conn.transaction() {
            Ok(tx) => tx,
            Err(e) => {
                error!("Failed to begin price transaction: {}", e);
                return 0;
            }
        };

        let mut inserted = 0;
        for bar in bars {
            if ![bar.open, bar.high, bar.low, bar.close].iter().all(|v| v.is_finite()) {
                debug!("Skipping non-finite bar {} {}", symbol, bar.date);
                continue;
            }
            let result = tx.execute(
                "INSERT OR IGNORE INTO stock_prices
                    (symbol, date, open, high, low, close, adj_close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    symbol,
                    format_date(bar.date),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.adjusted_close.filter(|v| v.is_finite()),
                    bar.volume.map(|v| v as i64),
                ],
            );
            match result {
                Ok(n) => inserted += n,
                Err(e) => warn!("Skipping price row {} {}: {}", symbol, bar.date, e),
            }
        }

        match tx.commit() {
            Ok(()) => {
                debug!("Saved {} new price rows for {}", inserted, symbol);
                inserted
            }
            Err(e) => {
                error!("Price transaction for {} rolled back: {}", symbol, e);
                0
            }
        }
    }

    /// Bars for a symbol within an inclusive date range, oldest first.
    pub fn get_stock_prices(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<PriceBar> {
        let conn = self.lock();
        let (start, end) = date_bounds(start, end);

        let mut stmt = match conn.prepare(
            "SELECT date, open, high, low, close, adj_close, volume
             FROM stock_prices
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
        ) {
            Ok(stmt) => stmt,
            Err(e) => {
                error!("Failed to prepare price query: {}", e);
                return Vec::new();
            }
        };

        let rows = stmt.query_map(params![symbol, start, end], price_from_row);
        match rows {
            Ok(rows) => rows.filter_map(|r| r.ok()).flatten().collect(),
            Err(e) => {
                error!("Error fetching prices for {}: {}", symbol, e);
                Vec::new()
            }
        }
    }

    /// Most recent stored bar.
    pub fn get_latest_price(&self, symbol: &str) -> Option<PriceBar> {
        let conn = self.lock();

        let result = conn.query_row(
            "SELECT date, open, high, low, close, adj_close, volume
             FROM stock_prices WHERE symbol = ?1
             ORDER BY date DESC LIMIT 1",
            params![symbol],
            price_from_row,
        );

        match result {
            Ok(bar) => bar,
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                error!("Error fetching latest price for {}: {}", symbol, e);
                None
            }
        }
    }

    // ========== Dividend Methods ==========

    /// Insert dividend events, ignoring ex-dates already stored.
    /// Returns the number of new rows.
    pub fn save_dividends(&self, symbol: &str, dividends: &[DividendEvent]) -> usize {
        let mut conn = self.lock();
        let tx = match conn.transaction() {
            Ok(tx) => tx,
            Err(e) => {
                error!("Failed to begin dividend transaction: {}", e);
                return 0;
            }
        };

        let mut inserted = 0;
        for dividend in dividends {
            let result = tx.execute(
                "INSERT OR IGNORE INTO dividends
                    (symbol, ex_date, amount, payment_date, dividend_type)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    symbol,
                    format_date(dividend.ex_date),
                    dividend.amount,
                    dividend.payment_date.map(format_date),
                    dividend.dividend_type,
                ],
            );
            match result {
                Ok(n) => inserted += n,
                Err(e) => warn!("Skipping dividend row {} {}: {}", symbol, dividend.ex_date, e),
            }
        }

        match tx.commit() {
            Ok(()) => {
                debug!("Saved {} new dividend rows for {}", inserted, symbol);
                inserted
            }
            Err(e) => {
                error!("Dividend transaction for {} rolled back: {}", symbol, e);
                0
            }
        }
    }

    /// Dividends on or after `start`, oldest first.
    pub fn get_dividends(&self, symbol: &str, start: Option<NaiveDate>) -> Vec<DividendEvent> {
        let conn = self.lock();
        let (start, _) = date_bounds(start, None);

        let mut stmt = match conn.prepare(
            "SELECT ex_date, amount, payment_date, dividend_type
             FROM dividends
             WHERE symbol = ?1 AND ex_date >= ?2
             ORDER BY ex_date ASC",
        ) {
            Ok(stmt) => stmt,
            Err(e) => {
                error!("Failed to prepare dividend query: {}", e);
                return Vec::new();
            }
        };

        let rows = stmt.query_map(params![symbol, start], |row| {
            let ex_date: String = row.get(0)?;
            let payment_date: Option<String> = row.get(2)?;
            Ok(parse_date(&ex_date).map(|ex_date| DividendEvent {
                ex_date,
                amount: row.get(1).unwrap_or_default(),
                payment_date: payment_date.as_deref().and_then(parse_date),
                dividend_type: row.get(3).unwrap_or_default(),
            }))
        });

        match rows {
            Ok(rows) => rows.filter_map(|r| r.ok()).flatten().collect(),
            Err(e) => {
                error!("Error fetching dividends for {}: {}", symbol, e);
                Vec::new()
            }
        }
    }

    // ========== Company Methods ==========

    /// Merge fundamentals into the stored row. Non-null incoming fields
    /// overwrite; null fields keep the stored value.
    pub fn save_company_info(&self, info: &CompanyInfo) -> Result<(), rusqlite::Error> {
        let conn = self.lock();

        let mut merged = read_company_info(&conn, &info.symbol)?
            .unwrap_or_else(|| CompanyInfo::new(info.symbol.clone()));
        merged.merge(info.clone());
        if merged.updated_at.is_none() {
            merged.updated_at = Some(Utc::now());
        }

        conn.execute(
            "INSERT OR REPLACE INTO company_info (
                symbol, name, sector, industry, market_cap, enterprise_value,
                pe_ratio, pb_ratio, dividend_yield, payout_ratio, beta,
                shares_outstanding, float_shares, week_52_high, week_52_low,
                currency, exchange, description, website, employees, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                       ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
            params![
                merged.symbol,
                merged.name,
                merged.sector,
                merged.industry,
                merged.market_cap,
                merged.enterprise_value,
                merged.pe_ratio,
                merged.pb_ratio,
                merged.dividend_yield,
                merged.payout_ratio,
                merged.beta,
                merged.shares_outstanding,
                merged.float_shares,
                merged.week_52_high,
                merged.week_52_low,
                merged.currency,
                merged.exchange,
                merged.description,
                merged.website,
                merged.employees,
                merged.updated_at.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ],
        )?;

        debug!("Saved company info for {}", merged.symbol);
        Ok(())
    }

    pub fn get_company_info(&self, symbol: &str) -> Option<CompanyInfo> {
        let conn = self.lock();
        match read_company_info(&conn, symbol) {
            Ok(info) => info,
            Err(e) => {
                error!("Error fetching company info for {}: {}", symbol, e);
                None
            }
        }
    }

    // ========== Indicator Methods ==========

    /// Store computed indicator values. A recomputed value for the same
    /// date and indicator replaces the stored one.
    pub fn save_indicator_values(&self, symbol: &str, values: &[IndicatorValue]) -> usize {
        let mut conn = self.lock();
        let tx = match conn.transaction() {
            Ok(tx) => tx,
            Err(e) => {
                error!("Failed to begin indicator transaction: {}", e);
                return 0;
            }
        };

        let mut written = 0;
        for value in values.iter().filter(|v| v.value.is_finite()) {
            let result = tx.execute(
                "INSERT OR REPLACE INTO technical_indicators
                    (symbol, date, indicator_name, value)
                 VALUES (?1, ?2, ?3, ?4)",
                params![symbol, format_date(value.date), value.name, value.value],
            );
            match result {
                Ok(n) => written += n,
                Err(e) => warn!("Skipping indicator {} {}: {}", symbol, value.name, e),
            }
        }

        match tx.commit() {
            Ok(()) => written,
            Err(e) => {
                error!("Indicator transaction for {} rolled back: {}", symbol, e);
                0
            }
        }
    }

    /// Stored values of one indicator, newest first.
    pub fn get_indicator_values(&self, symbol: &str, name: &str, limit: usize) -> Vec<IndicatorValue> {
        let conn = self.lock();

        let mut stmt = match conn.prepare(
            "SELECT date, indicator_name, value FROM technical_indicators
             WHERE symbol = ?1 AND indicator_name = ?2
             ORDER BY date DESC LIMIT ?3",
        ) {
            Ok(stmt) => stmt,
            Err(e) => {
                error!("Failed to prepare indicator query: {}", e);
                return Vec::new();
            }
        };

        let rows = stmt.query_map(params![symbol, name, limit as i64], |row| {
            let date: String = row.get(0)?;
            Ok(parse_date(&date).map(|date| IndicatorValue {
                date,
                name: row.get(1).unwrap_or_default(),
                value: row.get(2).unwrap_or_default(),
            }))
        });

        match rows {
            Ok(rows) => rows.filter_map(|r| r.ok()).flatten().collect(),
            Err(e) => {
                error!("Error fetching indicator {} for {}: {}", name, symbol, e);
                Vec::new()
            }
        }
    }

    // ========== News Methods ==========

    /// Store articles, ignoring URLs already seen. Returns the number of new rows.
    pub fn save_news_articles(&self, articles: &[NewsArticle]) -> usize {
        let mut conn = self.lock();
        let tx = match conn.transaction() {
            Ok(tx) => tx,
            Err(e) => {
                error!("Failed to begin news transaction: {}", e);
                return 0;
            }
        };

        let mut inserted = 0;
        for article in articles {
            let sentiment = article.sentiment.as_ref();
            let result = tx.execute(
                "INSERT OR IGNORE INTO news_articles
                    (symbol, title, url, source, description, published_at,
                     sentiment_compound, sentiment_positive, sentiment_negative, sentiment_neutral)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    article.symbol,
                    article.title,
                    article.url,
                    article.source,
                    article.description,
                    format_timestamp(article.published_at),
                    sentiment.map(|s| s.compound),
                    sentiment.map(|s| s.positive),
                    sentiment.map(|s| s.negative),
                    sentiment.map(|s| s.neutral),
                ],
            );
            match result {
                Ok(n) => inserted += n,
                Err(e) => warn!("Skipping news article {}: {}", article.url, e),
            }
        }

        match tx.commit() {
            Ok(()) => inserted,
            Err(e) => {
                error!("News transaction rolled back: {}", e);
                0
            }
        }
    }

    /// Articles for a symbol published within the last `days` days, newest first.
    pub fn get_recent_news(&self, symbol: &str, days: i64, limit: usize) -> Vec<NewsArticle> {
        let conn = self.lock();
        let cutoff = format_timestamp(Utc::now() - Duration::days(days));

        let mut stmt = match conn.prepare(
            "SELECT symbol, title, url, source, description, published_at,
                    sentiment_compound, sentiment_positive, sentiment_negative, sentiment_neutral
             FROM news_articles
             WHERE symbol = ?1 AND published_at >= ?2
             ORDER BY published_at DESC LIMIT ?3",
        ) {
            Ok(stmt) => stmt,
            Err(e) => {
                error!("Failed to prepare news query: {}", e);
                return Vec::new();
            }
        };

        let rows = stmt.query_map(params![symbol, cutoff, limit as i64], |row| {
            let published_at: String = row.get(5)?;
            let compound: Option<f64> = row.get(6)?;
            let sentiment = compound.map(|compound| SentimentScore {
                compound,
                positive: row.get::<_, Option<f64>>(7).ok().flatten().unwrap_or(0.0),
                negative: row.get::<_, Option<f64>>(8).ok().flatten().unwrap_or(0.0),
                neutral: row.get::<_, Option<f64>>(9).ok().flatten().unwrap_or(1.0),
            });
            Ok(parse_timestamp(&published_at).map(|published_at| NewsArticle {
                symbol: row.get(0).unwrap_or_default(),
                title: row.get(1).unwrap_or_default(),
                url: row.get(2).unwrap_or_default(),
                source: row.get(3).unwrap_or_default(),
                description: row.get(4).unwrap_or_default(),
                published_at,
                sentiment,
            }))
        });

        match rows {
            Ok(rows) => rows.filter_map(|r| r.ok()).flatten().collect(),
            Err(e) => {
                error!("Error fetching news for {}: {}", symbol, e);
                Vec::new()
            }
        }
    }

    // ========== Maintenance Methods ==========

    /// Close statistics over the last `days` days of stored data.
    pub fn price_statistics(&self, symbol: &str, days: i64) -> Option<PriceStatistics> {
        let conn = self.lock();
        let modifier = format!("-{} days", days.max(0));

        let result = conn.query_row(
            "SELECT COUNT(*), MIN(close), MAX(close), AVG(close), AVG(volume), MIN(date), MAX(date)
             FROM stock_prices
             WHERE symbol = ?1
               AND date >= date((SELECT MAX(date) FROM stock_prices WHERE symbol = ?1), ?2)",
            params![symbol, modifier],
            |row| {
                let count: i64 = row.get(0)?;
                let first: Option<String> = row.get(5)?;
                let last: Option<String> = row.get(6)?;
                Ok((count > 0).then(|| PriceStatistics {
                    symbol: symbol.to_string(),
                    count: count as usize,
                    min_close: row.get(1).unwrap_or_default(),
                    max_close: row.get(2).unwrap_or_default(),
                    avg_close: row.get(3).unwrap_or_default(),
                    avg_volume: row.get(4).unwrap_or_default(),
                    first_date: first.as_deref().and_then(parse_date),
                    last_date: last.as_deref().and_then(parse_date),
                }))
            },
        );

        match result {
            Ok(stats) => stats,
            Err(e) => {
                error!("Error computing price statistics for {}: {}", symbol, e);
                None
            }
        }
    }

    /// Row counts per table and file size.
    pub fn database_stats(&self) -> DatabaseStats {
        let conn = self.lock();
        let count = |table: &str| -> usize {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as usize)
            .unwrap_or(0)
        };

        let size_bytes = conn
            .query_row(
                "SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()",
                [],
                |row| row.get::<_, i64>(0),
            )
            .ok()
            .map(|n| n as u64);

        DatabaseStats {
            stock_prices: count("stock_prices"),
            dividends: count("dividends"),
            company_info: count("company_info"),
            technical_indicators: count("technical_indicators"),
            news_articles: count("news_articles"),
            symbols: conn
                .query_row(
                    "SELECT COUNT(DISTINCT symbol) FROM stock_prices",
                    [],
                    |row| row.get::<_, i64>(0),
                )
                .map(|n| n as usize)
                .unwrap_or(0),
            size_bytes,
        }
    }

    /// Delete prices, indicators and news older than `days_to_keep`.
    /// Dividends and fundamentals are kept.
    pub fn cleanup_old_data(&self, days_to_keep: i64) -> Result<usize, rusqlite::Error> {
        let mut conn = self.lock();
        let cutoff = Utc::now() - Duration::days(days_to_keep);
        let cutoff_date = format_date(cutoff.date_naive());

        let tx = conn.transaction()?;
        let mut count = tx.execute(
            "DELETE FROM stock_prices WHERE date < ?1",
            params![cutoff_date],
        )?;
        count += tx.execute(
            "DELETE FROM technical_indicators WHERE date < ?1",
            params![cutoff_date],
        )?;
        count += tx.execute(
            "DELETE FROM news_articles WHERE published_at < ?1",
            params![format_timestamp(cutoff)],
        )?;
        tx.commit()?;

        if count > 0 {
            info!("Cleaned up {} rows older than {} days", count, days_to_keep);
        }

        Ok(count)
    }

    /// Refresh query planner statistics and compact the file.
    pub fn optimize(&self) -> Result<(), rusqlite::Error> {
        let conn = self.lock();
        conn.execute_batch("ANALYZE; VACUUM;")?;
        info!("Database optimized");
        Ok(())
    }
}

/// Close statistics for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStatistics {
    pub symbol: String,
    pub count: usize,
    pub min_close: f64,
    pub max_close: f64,
    pub avg_close: f64,
    pub avg_volume: Option<f64>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Row counts per table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub stock_prices: usize,
    pub dividends: usize,
    pub company_info: usize,
    pub technical_indicators: usize,
    pub news_articles: usize,
    pub symbols: usize,
    pub size_bytes: Option<u64>,
}

fn read_company_info(conn: &Connection, symbol: &str) -> Result<Option<CompanyInfo>, rusqlite::Error> {
    conn.query_row(
        "SELECT symbol, name, sector, industry, market_cap, enterprise_value,
                pe_ratio, pb_ratio, dividend_yield, payout_ratio, beta,
                shares_outstanding, float_shares, week_52_high, week_52_low,
                currency, exchange, description, website, employees, updated_at
         FROM company_info WHERE symbol = ?1",
        params![symbol],
        |row| {
            let updated_at: Option<String> = row.get(20)?;
            Ok(CompanyInfo {
                symbol: row.get(0)?,
                name: row.get(1)?,
                sector: row.get(2)?,
                industry: row.get(3)?,
                market_cap: row.get(4)?,
                enterprise_value: row.get(5)?,
                pe_ratio: row.get(6)?,
                pb_ratio: row.get(7)?,
                dividend_yield: row.get(8)?,
                payout_ratio: row.get(9)?,
                beta: row.get(10)?,
                shares_outstanding: row.get(11)?,
                float_shares: row.get(12)?,
                week_52_high: row.get(13)?,
                week_52_low: row.get(14)?,
                currency: row.get(15)?,
                exchange: row.get(16)?,
                description: row.get(17)?,
                website: row.get(18)?,
                employees: row.get(19)?,
                updated_at: updated_at.as_deref().and_then(parse_timestamp),
            })
        },
    )
    .optional()
}

fn price_from_row(row: &Row<'_>) -> Result<Option<PriceBar>, rusqlite::Error> {
    let date: String = row.get(0)?;
    let Some(date) = parse_date(&date) else {
        warn!("Ignoring price row with malformed date {}", date);
        return Ok(None);
    };
    let adjusted_close: Option<f64> = row.get(5)?;
    let volume: Option<i64> = row.get(6)?;
    Ok(Some(PriceBar {
        date,
        open: row.get(1)?,
        high: row.get(2)?,
        low: row.get(3)?,
        close: row.get(4)?,
        adjusted_close,
        volume: volume.map(|v| v.max(0) as u64),
    }))
}

fn date_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> (String, String) {
    (
        start.map(format_date).unwrap_or_else(|| "0000-01-01".to_string()),
        end.map(format_date).unwrap_or_else(|| "9999-12-31".to_string()),
    )
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bar(d: NaiveDate, close: f64) -> PriceBar {
        PriceBar::new(d, close - 0.1, close + 0.2, close - 0.3, close).with_volume(1_000)
    }

    #[test]
    fn test_prices_first_write_wins() {
        let store = SqliteStore::new_in_memory().unwrap();
        let bars = vec![bar(date(2024, 3, 1), 7.0), bar(date(2024, 3, 4), 7.1)];

        assert_eq!(store.save_stock_prices("AFI.AX", &bars), 2);
        let revised = vec![bar(date(2024, 3, 4), 9.9), bar(date(2024, 3, 5), 7.2)];
        assert_eq!(store.save_stock_prices("AFI.AX", &revised), 1);

        let stored = store.get_stock_prices("AFI.AX", None, None);
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[1].close, 7.1);
        assert!(stored.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(stored[0].volume, Some(1_000));
    }

    #[test]
    fn test_price_range_and_latest() {
        let store = SqliteStore::new_in_memory().unwrap();
        let bars: Vec<PriceBar> = (1..=10).map(|d| bar(date(2024, 1, d), d as f64)).collect();
        store.save_stock_prices("CBA.AX", &bars);

        let range = store.get_stock_prices("CBA.AX", Some(date(2024, 1, 3)), Some(date(2024, 1, 5)));
        assert_eq!(range.len(), 3);
        assert_eq!(range[0].date, date(2024, 1, 3));

        let latest = store.get_latest_price("CBA.AX").unwrap();
        assert_eq!(latest.date, date(2024, 1, 10));
        assert!(store.get_latest_price("NOPE.AX").is_none());
        assert!(store.get_stock_prices("NOPE.AX", None, None).is_empty());
    }

    #[test]
    fn test_non_finite_bars_are_skipped() {
        let store = SqliteStore::new_in_memory().unwrap();
        let bars = vec![bar(date(2024, 1, 1), f64::NAN), bar(date(2024, 1, 2), 5.0)];
        assert_eq!(store.save_stock_prices("X.AX", &bars), 1);
    }

    #[test]
    fn test_dividend_first_write_wins() {
        let store = SqliteStore::new_in_memory().unwrap();
        let original = DividendEvent::new(date(2024, 3, 1), 0.14);
        assert_eq!(store.save_dividends("AFI.AX", &[original]), 1);

        let revised = DividendEvent::new(date(2024, 3, 1), 0.20);
        assert_eq!(store.save_dividends("AFI.AX", &[revised]), 0);

        let stored = store.get_dividends("AFI.AX", None);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].amount, 0.14);
        assert!(store.get_dividends("AFI.AX", Some(date(2024, 3, 2))).is_empty());
    }

    #[test]
    fn test_company_info_merge() {
        let store = SqliteStore::new_in_memory().unwrap();

        let mut first = CompanyInfo::new("AFI.AX");
        first.name = Some("Australian Foundation Investment Co".to_string());
        first.sector = Some("Financial Services".to_string());
        first.pe_ratio = Some(25.0);
        store.save_company_info(&first).unwrap();

        let mut second = CompanyInfo::new("AFI.AX");
        second.pe_ratio = Some(27.5);
        second.beta = Some(0.8);
        store.save_company_info(&second).unwrap();

        let stored = store.get_company_info("AFI.AX").unwrap();
        assert_eq!(stored.name.as_deref(), Some("Australian Foundation Investment Co"));
        assert_eq!(stored.sector.as_deref(), Some("Financial Services"));
        assert_eq!(stored.pe_ratio, Some(27.5));
        assert_eq!(stored.beta, Some(0.8));
        assert!(stored.updated_at.is_some());
        assert!(store.get_company_info("CBA.AX").is_none());
    }

    #[test]
    fn test_indicator_values_replace() {
        let store = SqliteStore::new_in_memory().unwrap();
        let d = date(2024, 5, 1);
        let values = vec![
            IndicatorValue { date: d, name: "rsi_14".to_string(), value: 55.0 },
            IndicatorValue { date: d, name: "sma_20".to_string(), value: 7.0 },
            IndicatorValue { date: d, name: "bad".to_string(), value: f64::NAN },
        ];
        assert_eq!(store.save_indicator_values("AFI.AX", &values), 2);

        let recomputed = vec![IndicatorValue { date: d, name: "rsi_14".to_string(), value: 56.0 }];
        store.save_indicator_values("AFI.AX", &recomputed);

        let rsi = store.get_indicator_values("AFI.AX", "rsi_14", 10);
        assert_eq!(rsi.len(), 1);
        assert_eq!(rsi[0].value, 56.0);
    }

    #[test]
    fn test_news_dedup_and_recent() {
        let store = SqliteStore::new_in_memory().unwrap();
        let now = Utc::now();
        let article = |url: &str, age_days: i64| NewsArticle {
            title: format!("Story {}", url),
            url: url.to_string(),
            source: "Test Wire".to_string(),
            published_at: now - Duration::days(age_days),
            description: None,
            symbol: Some("AFI.AX".to_string()),
            sentiment: Some(SentimentScore {
                compound: 0.4,
                positive: 0.3,
                negative: 0.0,
                neutral: 0.7,
            }),
        };

        let articles = vec![article("https://a", 1), article("https://b", 3), article("https://old", 30)];
        assert_eq!(store.save_news_articles(&articles), 3);
        assert_eq!(store.save_news_articles(&articles[..1]), 0);

        let recent = store.get_recent_news("AFI.AX", 7, 10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].url, "https://a");
        assert_eq!(recent[0].sentiment.as_ref().map(|s| s.compound), Some(0.4));
    }

    #[test]
    fn test_price_statistics_and_database_stats() {
        let store = SqliteStore::new_in_memory().unwrap();
        let bars: Vec<PriceBar> = (1..=20).map(|d| bar(date(2024, 2, d), d as f64)).collect();
        store.save_stock_prices("AFI.AX", &bars);
        store.save_dividends("AFI.AX", &[DividendEvent::new(date(2024, 2, 10), 0.1)]);

        let stats = store.price_statistics("AFI.AX", 4).unwrap();
        assert_eq!(stats.count, 5);
        assert_eq!(stats.min_close, 16.0);
        assert_eq!(stats.max_close, 20.0);
        assert_eq!(stats.last_date, Some(date(2024, 2, 20)));
        assert!(store.price_statistics("NOPE.AX", 30).is_none());

        let db = store.database_stats();
        assert_eq!(db.stock_prices, 20);
        assert_eq!(db.dividends, 1);
        assert_eq!(db.symbols, 1);
    }

    #[test]
    fn test_cleanup_and_optimize() {
        let store = SqliteStore::new_in_memory().unwrap();
        let today = Utc::now().date_naive();
        let bars = vec![bar(today - Duration::days(400), 5.0), bar(today, 6.0)];
        store.save_stock_prices("AFI.AX", &bars);

        assert_eq!(store.cleanup_old_data(365).unwrap(), 1);
        assert_eq!(store.get_stock_prices("AFI.AX", None, None).len(), 1);
        store.optimize().unwrap();
    }
}
