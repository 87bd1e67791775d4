//! Cache inspection and invalidation endpoints.

use super::{validate_symbol, ApiResponse};
use crate::error::Result;
use crate::services::CacheStats;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/", delete(clear_all))
        .route("/:symbol", delete(clear_symbol))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    pub removed: usize,
}

/// GET /api/cache/stats
async fn get_stats(State(state): State<AppState>) -> Json<ApiResponse<CacheStats>> {
    Json(ApiResponse::new(state.cache.stats().await))
}

/// DELETE /api/cache/:symbol
async fn clear_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<ClearResponse>>> {
    validate_symbol(&symbol)?;
    let removed = state.tracker.clear_cache(&symbol).await;
    let symbol = state.tracker.normalize_symbol(&symbol);
    Ok(Json(ApiResponse::for_symbol(ClearResponse { removed }, symbol)))
}

/// DELETE /api/cache
async fn clear_all(State(state): State<AppState>) -> Json<ApiResponse<ClearResponse>> {
    let removed = state.cache.clear_all().await;
    Json(ApiResponse::new(ClearResponse { removed }))
}
