//! Database maintenance endpoints.
//!
//! Provides endpoints for:
//! - Row counts and file size
//! - Per-symbol price statistics
//! - Manual cleanup and optimization

use super::{validate_symbol, ApiResponse};
use crate::error::{AppError, Result};
use crate::services::{DatabaseStats, PriceStatistics, SqliteStore};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Rows older than this many days are removed by default.
const DEFAULT_RETENTION_DAYS: i64 = 365 * 5;

/// Create storage API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_database_stats))
        .route("/statistics/:symbol", get(get_price_statistics))
        .route("/cleanup", post(run_cleanup))
        .route("/optimize", post(run_optimize))
}

#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub days_kept: i64,
    pub rows_deleted: usize,
}

fn require_store(state: &AppState) -> Result<&Arc<SqliteStore>> {
    state
        .store
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Database not configured".to_string()))
}

fn positive_days(days: Option<i64>, default: i64) -> Result<i64> {
    match days {
        Some(d) if d <= 0 => Err(AppError::BadRequest(format!("days must be positive, got {}", d))),
        Some(d) => Ok(d),
        None => Ok(default),
    }
}

/// GET /api/storage/stats
async fn get_database_stats(State(state): State<AppState>) -> Result<Json<ApiResponse<DatabaseStats>>> {
    let store = require_store(&state)?;
    Ok(Json(ApiResponse::new(store.database_stats())))
}

/// GET /api/storage/statistics/:symbol?days=
async fn get_price_statistics(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<ApiResponse<PriceStatistics>>> {
    validate_symbol(&symbol)?;
    let days = positive_days(query.days, 365)?;
    let store = require_store(&state)?;
    let symbol = state.tracker.normalize_symbol(&symbol);
    let stats = store
        .price_statistics(&symbol, days)
        .ok_or_else(|| AppError::NotFound(format!("No stored prices for {}", symbol)))?;
    Ok(Json(ApiResponse::for_symbol(stats, symbol)))
}

/// POST /api/storage/cleanup?days=
async fn run_cleanup(
    State(state): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<ApiResponse<CleanupResponse>>> {
    let days = positive_days(query.days, DEFAULT_RETENTION_DAYS)?;
    let store = require_store(&state)?;
    let rows_deleted = store.cleanup_old_data(days)?;
    info!("Cleanup removed {} rows older than {} days", rows_deleted, days);
    Ok(Json(ApiResponse::new(CleanupResponse {
        days_kept: days,
        rows_deleted,
    })))
}

/// POST /api/storage/optimize
async fn run_optimize(State(state): State<AppState>) -> Result<Json<ApiResponse<DatabaseStats>>> {
    let store = require_store(&state)?;
    store.optimize()?;
    Ok(Json(ApiResponse::new(store.database_stats())))
}
