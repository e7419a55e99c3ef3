// Shared fixtures for the HTTP and export tests

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use drip_dashboard::models::{DashboardQuote, MarketSnapshot};
use drip_dashboard::services::market_data::SnapshotProvider;
use drip_dashboard::services::quote_cache::QuoteStore;
use drip_dashboard::state::AppState;
use drip_dashboard::BoxError;

/// Canned market data: KO matches the default form inputs, TSLA pays nothing, DOWN always fails.
pub struct StubProvider;

#[async_trait]
impl SnapshotProvider for StubProvider {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, BoxError> {
        match symbol {
            "DOWN" => Err("connection refused".into()),
            "TSLA" => Ok(MarketSnapshot {
                current_price: Some(200.0),
                dividend_yield_percent: Some(0.0),
                dividend_growth_rate_percent: Some(0.0),
                last_updated: "2024-06-30 12:00:00".into(),
                ..Default::default()
            }),
            _ => Ok(MarketSnapshot {
                current_price: Some(100.0),
                dividend_yield_percent: Some(2.5),
                dividend_growth_rate_percent: Some(5.0),
                last_updated: "2024-06-30 12:00:00".into(),
                long_name: Some(format!("{} Inc.", symbol)),
                annual_dividends: vec![(2022, 1.0), (2023, 1.05)],
                historical_prices: vec![("2024-05-01".into(), 98.5), ("2024-06-01".into(), 100.0)],
            }),
        }
    }
}

pub fn quote(symbol: &str, price: &str) -> DashboardQuote {
    DashboardQuote {
        symbol: symbol.to_string(),
        company_name: format!("{} Inc.", symbol),
        logo: String::new(),
        current_price: price.to_string(),
        high_price: price.to_string(),
        low_price: price.to_string(),
        open_price: price.to_string(),
        prev_close_price: price.to_string(),
        change: "0.00".to_string(),
        percentage_change: "0.00".to_string(),
        timestamp: 1_719_748_800_000,
    }
}

pub fn test_state(quotes: Arc<QuoteStore>) -> Arc<AppState> {
    Arc::new(AppState {
        provider: Arc::new(StubProvider),
        quotes,
        stock_symbols: vec!["AAPL".into(), "KO".into(), "PEP".into()],
        ticker_delay: Duration::ZERO,
    })
}

/// Reference scenario: $10,000 for 10 years, quarterly DRIP, 2.5% yield, 5% dividend and 7% price growth.
pub fn calculator_form(tickers: &[&str]) -> String {
    let mut pairs: Vec<String> = tickers.iter().map(|t| format!("tickers={}", t)).collect();
    pairs.extend(
        [
            "initial_investment=10000",
            "investment_years=10",
            "drip_enabled=yes",
            "initial_share_price=100",
            "dividend_yield=2.5",
            "annual_dividend_growth_rate=5",
            "annual_stock_price_growth_rate=7",
            "payout_frequency=Quarterly",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    pairs.join("&")
}

/// Same inputs named the way the export forms name them.
pub fn export_form(tickers: &str, suffix: &str) -> String {
    [
        ("tickers_hidden", tickers),
        ("initial_investment", "10000"),
        ("investment_years", "10"),
        ("drip_enabled", "yes"),
        ("initial_share_price", "100"),
        ("dividend_yield", "2.5"),
        ("annual_dividend_growth_rate", "5"),
        ("annual_stock_price_growth_rate", "7"),
        ("payout_frequency", "Quarterly"),
    ]
    .iter()
    .map(|(k, v)| format!("export_{}{}={}", k, suffix, v))
    .collect::<Vec<_>>()
    .join("&")
}

pub fn plain_number(formatted: &str) -> f64 {
    formatted.replace(['$', ','], "").parse().unwrap()
}
