//! stockwatch - personal ASX stock tracker
//!
//! Pulls daily prices, fundamentals, dividends and news for a symbol,
//! computes technical and financial indicators, stores the results in
//! SQLite and renders them as a terminal report or a web dashboard.

pub mod api;
pub mod config;
pub mod error;
pub mod report;
pub mod services;
pub mod sources;
pub mod types;

pub use config::{Capabilities, Config, ProviderEndpoints};
pub use error::{AppError, Result};
pub use services::{CacheService, SqliteStore, StockTracker};
pub use api::AppState;
