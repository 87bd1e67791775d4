pub mod analysis;
pub mod cache;
pub mod dashboard;
pub mod health;
pub mod storage;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::{CacheService, SqliteStore, StockTracker};
use crate::types::Period;
use axum::Router;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tracker: Arc<StockTracker>,
    pub cache: Arc<CacheService>,
    pub store: Option<Arc<SqliteStore>>,
}

/// API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub meta: ApiMeta,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMeta {
    pub symbol: Option<String>,
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: ApiMeta {
                symbol: None,
                timestamp: chrono::Utc::now().timestamp_millis(),
            },
        }
    }

    pub fn for_symbol(data: T, symbol: impl Into<String>) -> Self {
        let mut response = Self::new(data);
        response.meta.symbol = Some(symbol.into());
        response
    }
}

/// Reject symbols that cannot be a ticker.
pub(crate) fn validate_symbol(symbol: &str) -> Result<()> {
    let symbol = symbol.trim();
    let valid = !symbol.is_empty()
        && symbol.len() <= 12
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^'));
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid symbol: {}", symbol)))
    }
}

/// Parse an optional period query value, falling back to the configured default.
pub(crate) fn parse_period(value: Option<&str>, default: Period) -> Result<Period> {
    match value {
        None => Ok(default),
        Some(v) => Period::parse(v).ok_or_else(|| AppError::BadRequest(format!("Unknown period: {}", v))),
    }
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(dashboard::router())
        .merge(health::router())
        .merge(analysis::router())
        .nest("/api/cache", cache::router())
        .nest("/api/storage", storage::router())
}

/// The full application with middleware and state applied.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
