use dotenv::dotenv;
use drip_dashboard::config::AppConfig;
use drip_dashboard::services::finnhub::FinnhubClient;
use log::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().map_err(|e| e.to_string())?;
    let Some(key) = config.finnhub_api_key else {
        return Err("FINNHUB_API_KEY must be set".into());
    };
    let client = FinnhubClient::new(config.finnhub_base_url, key);

    let symbols: Vec<String> = match std::env::args().nth(1) {
        Some(arg) => vec![arg.to_uppercase()],
        None => config.stock_symbols.into_iter().take(3).collect(),
    };

    for symbol in &symbols {
        match client.fetch_quote(symbol).await {
            Ok(quote) => info!("SUCCESS: {:?}", quote),
            Err(e) => error!("ERROR: {} failed: {}", symbol, e),
        }
    }

    Ok(())
}
