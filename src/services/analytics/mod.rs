//! Scalar financial summaries and forward-looking analysis.

pub mod financial;
pub mod predictive;

pub use financial::{daily_returns, dividend_metrics, max_drawdown, return_metrics};
pub use predictive::{predict_trend, support_resistance, volatility_forecast};
