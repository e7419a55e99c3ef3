use dotenv::dotenv;
use drip_dashboard::config::AppConfig;
use drip_dashboard::models::SimulationOutcome;
use drip_dashboard::services::calculator::CalculatorRequest;
use drip_dashboard::services::drip;
use drip_dashboard::services::market_data::SnapshotProvider;
use drip_dashboard::services::yahoo::YahooClient;
use log::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let symbol = std::env::args().nth(1).unwrap_or_else(|| "KO".to_string()).to_uppercase();
    let config = AppConfig::from_env().map_err(|e| e.to_string())?;
    let client = YahooClient::new(config.yahoo_base_url)?;

    info!("Testing Yahoo Finance snapshot for {}...", symbol);
    let snapshot = match client.fetch_snapshot(&symbol).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("ERROR: Failed to fetch Yahoo Finance snapshot: {}", e);
            return Err(e);
        }
    };
    info!("SUCCESS: {:#?}", snapshot);

    let params = CalculatorRequest::default().params;
    match drip::simulate(&symbol, &snapshot, &params) {
        SimulationOutcome::Projected(result) => info!(
            "{} over {} years: {:.2} with DRIP, {:.2} without",
            symbol, params.investment_years, result.final_value_with_drip, result.final_value_no_drip
        ),
        other => info!("No projection: {:?}", other),
    }

    Ok(())
}
