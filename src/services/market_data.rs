// src/services/market_data.rs
use async_trait::async_trait;

use crate::models::MarketSnapshot;
use crate::BoxError;

/// Source of per-ticker fundamentals for the DRIP calculator.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, BoxError>;
}
