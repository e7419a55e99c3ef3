// src/routes.rs
use log::{error, info};
use std::convert::Infallible;
use std::sync::Arc;
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::calculator::{get_calculator, post_calculator};
use crate::handlers::error::ApiError;
use crate::handlers::export::{export_csv, export_pdf};
use crate::handlers::stocks::get_stocks;
use crate::state::AppState;

const MAX_FORM_BYTES: u64 = 64 * 1024;

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        code = StatusCode::BAD_REQUEST;
        message = e.to_string();
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        code = StatusCode::BAD_REQUEST;
        message = "Missing form data. Please submit the form fields in the request body.".to_string();
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        code = StatusCode::PAYLOAD_TOO_LARGE;
        message = "Form too large".to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        error!("Unhandled rejection: {:?}", err);
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

fn form_body() -> impl Filter<Extract = (Vec<(String, String)>,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_FORM_BYTES).and(warp::body::form())
}

/// Every route, with JSON error recovery. CORS wraps the recovered responses so errors carry the headers too.
pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let stocks_route = warp::path!("api" / "stocks")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_stocks);

    let calculator_get_route = warp::path!("api" / "v1" / "calculator")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_calculator);

    let calculator_post_route = warp::path!("api" / "v1" / "calculator")
        .and(warp::post())
        .and(form_body())
        .and(state_filter.clone())
        .and_then(post_calculator);

    let export_csv_route = warp::path!("export_csv")
        .and(warp::post())
        .and(form_body())
        .and(state_filter.clone())
        .and_then(export_csv);

    let export_pdf_route = warp::path!("export_pdf")
        .and(warp::post())
        .and(form_body())
        .and(state_filter.clone())
        .and_then(export_pdf);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST"]);

    info!("All routes configured successfully.");

    stocks_route
        .or(calculator_get_route)
        .or(calculator_post_route)
        .or(export_csv_route)
        .or(export_pdf_route)
        .recover(handle_rejection)
        .with(cors)
}
