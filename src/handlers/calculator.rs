// src/handlers/calculator.rs
use log::{info, warn};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Rejection, Reply};

use crate::services::calculator::{self, FormFields, FormLayout};
use crate::services::view::CalculatorView;
use crate::state::AppState;

pub async fn get_calculator(state: Arc<AppState>) -> Result<Response, Rejection> {
    info!("Handling request for calculator defaults.");
    Ok(warp::reply::json(&CalculatorView::defaults(&state.stock_symbols)).into_response())
}

pub async fn post_calculator(form: Vec<(String, String)>, state: Arc<AppState>) -> Result<Response, Rejection> {
    let fields = FormFields(form);

    let request = match calculator::parse_request(&fields, FormLayout::CALCULATOR) {
        Ok(request) => request,
        Err(errors) => {
            warn!("Rejected calculator form with {} errors", errors.len());
            let messages = errors.iter().map(|e| e.to_string()).collect();
            let view = CalculatorView::rejected(messages, &state.stock_symbols);
            return Ok(warp::reply::with_status(warp::reply::json(&view), StatusCode::BAD_REQUEST).into_response());
        }
    };

    info!("Running calculator for {:?}", request.tickers);
    let report = calculator::run_batch(state.provider.as_ref(), &request, state.ticker_delay).await;
    let view = CalculatorView::from_report(&request, &report, &state.stock_symbols);
    Ok(warp::reply::json(&view).into_response())
}
