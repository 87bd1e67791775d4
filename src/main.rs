//! stockwatch command line.
//!
//! Commands:
//! - `analyze` (default) - full analysis of one symbol printed as a report
//! - `dashboard` - serve the web dashboard
//! - `self-test` - show configured providers and run a quick fetch
//! - `cache-clear` - drop cached provider data

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use stockwatch::api::{self, AppState};
use stockwatch::report::{render_capabilities, render_command_reference, render_report};
use stockwatch::services::{CacheService, SqliteStore, StockTracker};
use stockwatch::types::Period;
use stockwatch::{Capabilities, Config};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "stockwatch",
    version,
    about = "Personal ASX stock tracker with technical analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a full analysis and print the report.
    Analyze {
        /// Ticker, e.g. AFI or CBA.AX. Defaults to DEFAULT_SYMBOL.
        #[arg(long, short)]
        symbol: Option<String>,

        /// Lookback period: 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd or max.
        #[arg(long, short)]
        period: Option<Period>,
    },
    /// Serve the web dashboard.
    Dashboard {
        /// Bind address. Defaults to HOST.
        #[arg(long)]
        host: Option<String>,

        /// Port. Defaults to PORT.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Check providers, cache and database, then fetch a few days of data.
    SelfTest,
    /// Drop cached provider data for one symbol, or everything.
    CacheClear {
        #[arg(long, short)]
        symbol: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing; the report goes to stdout so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockwatch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command.unwrap_or(Command::Analyze {
        symbol: None,
        period: None,
    }) {
        Command::Analyze { symbol, period } => {
            let state = build_state(config).await?;
            let symbol = symbol.unwrap_or_else(|| state.config.default_symbol.clone());
            let period = period.unwrap_or(state.config.default_period);
            analyze(&state, &symbol, period).await
        }
        Command::Dashboard { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            let state = build_state(config).await?;
            serve(state).await
        }
        Command::SelfTest => {
            let state = build_state(config).await?;
            self_test(&state).await;
            Ok(())
        }
        Command::CacheClear { symbol } => {
            let state = build_state(config).await?;
            let removed = match symbol {
                Some(symbol) => state.tracker.clear_cache(&symbol).await,
                None => state.cache.clear_all().await,
            };
            println!("Removed {} cache entries ({})", removed, state.cache.backend_name());
            Ok(())
        }
    }
}

/// Wire up cache, database and tracker from the configuration.
async fn build_state(config: Config) -> anyhow::Result<AppState> {
    let capabilities = Capabilities::resolve(&config);

    let cache = if !config.cache_enabled {
        info!("Cache disabled");
        CacheService::disabled()
    } else if let Some(ref redis_url) = config.redis_url {
        CacheService::connect(redis_url, config.cache_default_ttl).await
    } else {
        CacheService::memory(config.cache_default_ttl)
    };
    let cache = Arc::new(cache);

    let store = match SqliteStore::new(&config.database_path) {
        Ok(store) => {
            info!("Using database {}", config.database_path);
            Some(Arc::new(store))
        }
        Err(e) => {
            warn!(
                "Failed to open database {}: {}. Results will not be saved",
                config.database_path, e
            );
            None
        }
    };

    let config = Arc::new(config);
    let tracker = StockTracker::new(
        config.as_ref().clone(),
        capabilities,
        cache.clone(),
        store.clone(),
    )
    .context("failed to create stock tracker")?;

    Ok(AppState {
        config,
        tracker: Arc::new(tracker),
        cache,
        store,
    })
}

async fn analyze(state: &AppState, symbol: &str, period: Period) -> anyhow::Result<()> {
    match state.tracker.run_analysis(symbol, period).await {
        Ok(report) => {
            print!("{}", render_report(&report));
            Ok(())
        }
        Err(e) => {
            error!("Analysis failed for {}: {}", symbol, e);
            Err(e.into())
        }
    }
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let app = api::app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("stockwatch dashboard listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn self_test(state: &AppState) {
    println!("stockwatch {} self-test", env!("CARGO_PKG_VERSION"));
    print!("{}", render_capabilities(&state.tracker.capabilities()));

    println!("\nConnectivity");
    println!("{}", "-".repeat(64));
    let stats = state.cache.stats().await;
    println!("  {:<26}{}", "Cache backend", stats.backend);
    match &state.store {
        Some(store) => {
            let db = store.database_stats();
            println!(
                "  {:<26}{} price rows, {} symbols",
                "Database", db.stock_prices, db.symbols
            );
        }
        None => println!("  {:<26}unavailable", "Database"),
    }

    let symbol = state.tracker.normalize_symbol(&state.config.default_symbol);
    match state.tracker.gather(&symbol, Period::FiveDays).await {
        Ok(data) => {
            let last = data.bars.last().map(|b| b.close).unwrap_or_default();
            println!(
                "  {:<26}ok, {} bars for {}, last close ${:.2}",
                "Quick fetch",
                data.bars.len(),
                symbol,
                last
            );
        }
        Err(e) => println!("  {:<26}failed: {}", "Quick fetch", e),
    }

    print!("{}", render_command_reference());
}
