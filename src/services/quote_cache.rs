// src/services/quote_cache.rs
use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio_cron_scheduler::{Job, JobScheduler};

use super::finnhub::FinnhubClient;
use crate::models::DashboardQuote;
use crate::BoxError;

/// Latest dashboard quote per symbol. A missing symbol just means it has not been fetched yet.
#[derive(Debug, Default)]
pub struct QuoteStore {
    quotes: Mutex<HashMap<String, DashboardQuote>>,
}

impl QuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, DashboardQuote>> {
        // A panic while holding the lock leaves the map intact, so keep serving it.
        self.quotes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, symbol: &str) -> Option<DashboardQuote> {
        self.lock().get(symbol).cloned()
    }

    pub fn snapshot(&self) -> HashMap<String, DashboardQuote> {
        self.lock().clone()
    }

    pub fn upsert(&self, quote: DashboardQuote) {
        self.lock().insert(quote.symbol.clone(), quote);
    }
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<DashboardQuote, BoxError>;
}

#[async_trait]
impl QuoteSource for FinnhubClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<DashboardQuote, BoxError> {
        FinnhubClient::fetch_quote(self, symbol).await
    }
}

pub struct QuoteRefresher {
    source: Arc<dyn QuoteSource>,
    store: Arc<QuoteStore>,
    symbols: Vec<String>,
    symbol_delay: Duration,
    in_flight: tokio::sync::Mutex<()>,
}

impl QuoteRefresher {
    pub fn new(
        source: Arc<dyn QuoteSource>,
        store: Arc<QuoteStore>,
        symbols: Vec<String>,
        symbol_delay: Duration,
    ) -> Self {
        QuoteRefresher {
            source,
            store,
            symbols,
            symbol_delay,
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Fetches every configured symbol once. Returns how many quotes were updated,
    /// or `None` when a previous run is still going.
    pub async fn refresh_all(&self) -> Option<usize> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("Previous quote refresh still running, skipping this tick");
            return None;
        };

        let started = Instant::now();
        let mut updated = 0;
        for (i, symbol) in self.symbols.iter().enumerate() {
            if i > 0 && !self.symbol_delay.is_zero() {
                tokio::time::sleep(self.symbol_delay).await;
            }
            match self.source.fetch_quote(symbol).await {
                Ok(quote) => {
                    self.store.upsert(quote);
                    updated += 1;
                }
                Err(e) => error!("Error fetching dashboard data for {}: {}", symbol, e),
            }
        }

        info!(
            "Refreshed {}/{} dashboard quotes in {:?}",
            updated,
            self.symbols.len(),
            started.elapsed()
        );
        Some(updated)
    }
}

/// Runs one refresh immediately, then schedules a repeating one every `interval`.
pub async fn start_refresh_job(refresher: Arc<QuoteRefresher>, interval: Duration) -> Result<JobScheduler, BoxError> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| format!("Failed to create scheduler: {:?}", e))?;

    let initial = refresher.clone();
    tokio::spawn(async move {
        initial.refresh_all().await;
    });

    let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let refresher = refresher.clone();
        Box::pin(async move {
            debug!("Quote refresh tick");
            refresher.refresh_all().await;
        })
    })
    .map_err(|e| format!("Failed to create quote refresh job: {:?}", e))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| format!("Failed to add quote refresh job: {:?}", e))?;
    scheduler
        .start()
        .await
        .map_err(|e| format!("Failed to start scheduler: {:?}", e))?;

    info!("Quote refresh scheduled every {:?}", interval);
    Ok(scheduler)
}
