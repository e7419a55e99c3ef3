use anyhow::Context;
use dotenv::dotenv;
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;

use drip_dashboard::config::AppConfig;
use drip_dashboard::routes;
use drip_dashboard::services::finnhub::FinnhubClient;
use drip_dashboard::services::quote_cache::{start_refresh_job, QuoteRefresher, QuoteStore};
use drip_dashboard::services::yahoo::YahooClient;
use drip_dashboard::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let config = AppConfig::from_env()?;

    let provider = YahooClient::new(config.yahoo_base_url.clone())
        .map_err(|e| anyhow::anyhow!("failed to build Yahoo client: {}", e))?;
    let quotes = Arc::new(QuoteStore::new());

    // Kept alive for the lifetime of the server; dropping it stops the refresh job.
    let _scheduler = match &config.finnhub_api_key {
        Some(key) => {
            let source = Arc::new(FinnhubClient::new(config.finnhub_base_url.clone(), key.clone()));
            let refresher = Arc::new(QuoteRefresher::new(
                source,
                quotes.clone(),
                config.stock_symbols.clone(),
                config.symbol_delay,
            ));
            let scheduler = start_refresh_job(refresher, config.fetch_interval)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))
                .context("failed to start quote refresh job")?;
            Some(scheduler)
        }
        None => {
            warn!("Quote refresh disabled; /api/stocks will stay empty");
            None
        }
    };

    let state = Arc::new(AppState {
        provider: Arc::new(provider),
        quotes,
        stock_symbols: config.stock_symbols.clone(),
        ticker_delay: config.ticker_delay,
    });

    let api = routes::routes(state);
    info!("Routes configured successfully with CORS.");

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
