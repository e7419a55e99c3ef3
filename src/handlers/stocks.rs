// src/handlers/stocks.rs
use log::info;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::state::AppState;

/// Latest cached quotes keyed by symbol. Symbols not fetched yet are simply absent.
pub async fn get_stocks(state: Arc<AppState>) -> Result<Json, Rejection> {
    let quotes = state.quotes.snapshot();
    info!("Serving {} of {} dashboard quotes", quotes.len(), state.stock_symbols.len());
    Ok(warp::reply::json(&quotes))
}
