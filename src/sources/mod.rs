pub mod alphavantage;
pub mod finnhub;
pub mod http;
pub mod newsapi;
pub mod yahoo;

pub use alphavantage::{AlphaVantageClient, AlphaVantageQuote};
pub use finnhub::FinnhubClient;
pub use http::{HttpSettings, RetryingClient};
pub use newsapi::NewsApiClient;
pub use yahoo::{YahooFinanceClient, YahooHistory, YahooQuoteMeta};
