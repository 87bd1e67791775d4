//! Analysis, price, indicator and news endpoints.

use super::{parse_period, validate_symbol, ApiResponse};
use crate::error::{AppError, Result};
use crate::services::signals::{detect_patterns, IndicatorSet, NamedSeries, MAX_PATTERN_SCAN};
use crate::services::tracker::display_name;
use crate::types::{AnalysisReport, NewsArticle, PatternHits, Period, PriceBar};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default news window in days.
const DEFAULT_NEWS_DAYS: i64 = 7;

/// Articles returned per news request.
const NEWS_LIMIT: usize = 50;

/// Symbols offered by the dashboard picker.
pub const DASHBOARD_SYMBOLS: [&str; 8] = [
    "AFI.AX", "CBA.AX", "BHP.AX", "CSL.AX", "WBC.AX", "ANZ.AX", "NAB.AX", "TLS.AX",
];

/// Periods offered by the dashboard picker.
pub const DASHBOARD_PERIODS: [Period; 6] = [
    Period::OneMonth,
    Period::ThreeMonths,
    Period::SixMonths,
    Period::OneYear,
    Period::TwoYears,
    Period::FiveYears,
];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/symbols", get(get_symbols))
        .route("/api/analysis/:symbol", get(get_analysis))
        .route("/api/prices/:symbol", get(get_prices))
        .route("/api/indicators/:symbol", get(get_indicators))
        .route("/api/news/:symbol", get(get_news))
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolOption {
    pub symbol: &'static str,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolsResponse {
    pub symbols: Vec<SymbolOption>,
    pub periods: Vec<Period>,
    pub default_symbol: String,
    pub default_period: Period,
}

/// Bars with every indicator series aligned to them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorsResponse {
    pub period: Period,
    pub bars: Vec<PriceBar>,
    pub dates: Vec<NaiveDate>,
    pub series: Vec<NamedSeries>,
    pub patterns: PatternHits,
}

fn parse_date(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|_| AppError::BadRequest(format!("Invalid {} date: {}", name, v)))
        })
        .transpose()
}

/// GET /api/symbols
async fn get_symbols(State(state): State<AppState>) -> Json<ApiResponse<SymbolsResponse>> {
    let symbols = DASHBOARD_SYMBOLS
        .iter()
        .map(|symbol| SymbolOption {
            symbol: *symbol,
            name: display_name(symbol),
        })
        .collect();
    Json(ApiResponse::new(SymbolsResponse {
        symbols,
        periods: DASHBOARD_PERIODS.to_vec(),
        default_symbol: state.tracker.normalize_symbol(&state.config.default_symbol),
        default_period: state.config.default_period,
    }))
}

/// GET /api/analysis/:symbol?period=
async fn get_analysis(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<ApiResponse<AnalysisReport>>> {
    validate_symbol(&symbol)?;
    let period = parse_period(query.period.as_deref(), state.config.default_period)?;
    let report = state.tracker.run_analysis(&symbol, period).await?;
    let symbol = report.symbol.clone();
    Ok(Json(ApiResponse::for_symbol(report, symbol)))
}

/// GET /api/prices/:symbol?start=&end=
///
/// Reads stored bars only; nothing is fetched.
async fn get_prices(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<ApiResponse<Vec<PriceBar>>>> {
    validate_symbol(&symbol)?;
    let start = parse_date("start", query.start.as_deref())?;
    let end = parse_date("end", query.end.as_deref())?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(AppError::BadRequest("start is after end".to_string()));
        }
    }
    let symbol = state.tracker.normalize_symbol(&symbol);
    let bars = state.tracker.stored_prices(&symbol, start, end);
    Ok(Json(ApiResponse::for_symbol(bars, symbol)))
}

/// GET /api/indicators/:symbol?period=
async fn get_indicators(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<ApiResponse<IndicatorsResponse>>> {
    validate_symbol(&symbol)?;
    let period = parse_period(query.period.as_deref(), state.config.default_period)?;
    let data = state.tracker.gather(&symbol, period).await?;
    let set = IndicatorSet::compute_default(&data.bars);
    let patterns = detect_patterns(&data.bars, MAX_PATTERN_SCAN);
    Ok(Json(ApiResponse::for_symbol(
        IndicatorsResponse {
            period,
            dates: set.dates,
            series: set.series,
            patterns,
            bars: data.bars,
        },
        data.symbol,
    )))
}

/// GET /api/news/:symbol?days=
///
/// Stored articles, newest first.
async fn get_news(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<ApiResponse<Vec<NewsArticle>>>> {
    validate_symbol(&symbol)?;
    let days = query.days.unwrap_or(DEFAULT_NEWS_DAYS);
    if !(1..=365).contains(&days) {
        return Err(AppError::BadRequest(format!(
            "days must be between 1 and 365, got {}",
            days
        )));
    }
    let symbol = state.tracker.normalize_symbol(&symbol);
    let articles = state
        .store
        .as_ref()
        .map(|store| store.get_recent_news(&symbol, days, NEWS_LIMIT))
        .unwrap_or_default();
    Ok(Json(ApiResponse::for_symbol(articles, symbol)))
}
