// src/state.rs
use std::sync::Arc;
use std::time::Duration;

use crate::services::market_data::SnapshotProvider;
use crate::services::quote_cache::QuoteStore;

/// Shared handles injected into every handler.
pub struct AppState {
    pub provider: Arc<dyn SnapshotProvider>,
    pub quotes: Arc<QuoteStore>,
    pub stock_symbols: Vec<String>,
    /// Pause between tickers in a batch, to stay under upstream rate limits.
    pub ticker_delay: Duration,
}
