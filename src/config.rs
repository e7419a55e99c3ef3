// src/config.rs
use log::{info, warn};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::services::{finnhub, yahoo};

/// Symbols shown on the dashboard when `STOCK_SYMBOLS` is not set.
pub const DEFAULT_STOCK_SYMBOLS: [&str; 54] = [
    "AAPL", "MSFT", "GOOG", "AMZN", "NVDA", "TSLA", "IBM", "META", "JPM", "KO", "PG", "UNH", "VOO", "SPY",
    "INTC", "PEP", "V", "MA", "DIS", "NFLX", "ADBE", "CRM", "ORCL", "CSCO", "BA", "WMT", "CVX", "XOM",
    "BAC", "T", "NKE", "MCD", "HD", "PFE", "MRK", "ABT", "TMO", "LLY", "COST", "AVGO", "GE", "DHR",
    "BMY", "CAT", "QCOM", "AMAT", "AMD", "FDX", "UPS", "GILD", "AXP", "DE", "BKNG", "ZTS",
];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub finnhub_api_key: Option<String>,
    pub finnhub_base_url: String,
    pub yahoo_base_url: String,
    pub stock_symbols: Vec<String>,
    pub fetch_interval: Duration,
    pub symbol_delay: Duration,
    pub ticker_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 3030,
            finnhub_api_key: None,
            finnhub_base_url: finnhub::DEFAULT_BASE_URL.to_string(),
            yahoo_base_url: yahoo::DEFAULT_BASE_URL.to_string(),
            stock_symbols: DEFAULT_STOCK_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            fetch_interval: Duration::from_secs(30),
            symbol_delay: Duration::from_millis(500),
            ticker_delay: Duration::from_millis(100),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} must be a number, got '{}': {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Reads settings from the environment. Call `dotenv().ok()` first to pick up a `.env` file.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = AppConfig::default();

        let port = match env::var("PORT") {
            Ok(_) => parse_var("PORT", defaults.port)?,
            Err(_) => {
                warn!("$PORT not set, defaulting to {}", defaults.port);
                defaults.port
            }
        };

        let finnhub_api_key = env::var("FINNHUB_API_KEY").ok().filter(|k| !k.trim().is_empty());
        if finnhub_api_key.is_none() {
            warn!("FINNHUB_API_KEY not set, dashboard quotes will not be refreshed");
        }

        let stock_symbols = match env::var("STOCK_SYMBOLS") {
            Ok(list) => crate::services::calculator::normalize_tickers([list.as_str()]),
            Err(_) => defaults.stock_symbols,
        };

        let config = AppConfig {
            port,
            finnhub_api_key,
            finnhub_base_url: env::var("FINNHUB_BASE_URL").unwrap_or(defaults.finnhub_base_url),
            yahoo_base_url: env::var("YAHOO_BASE_URL").unwrap_or(defaults.yahoo_base_url),
            stock_symbols,
            fetch_interval: Duration::from_secs(parse_var("FETCH_INTERVAL_SECONDS", 30u64)?.max(1)),
            symbol_delay: Duration::from_millis(parse_var("SYMBOL_DELAY_MS", 500u64)?),
            ticker_delay: Duration::from_millis(parse_var("TICKER_DELAY_MS", 100u64)?),
        };

        info!(
            "Configuration loaded: port {}, {} dashboard symbols, refresh every {:?}",
            config.port,
            config.stock_symbols.len(),
            config.fetch_interval
        );
        Ok(config)
    }
}
