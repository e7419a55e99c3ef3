// src/handlers/export.rs
use log::{error, info, warn};
use std::sync::Arc;
use warp::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use warp::http::Response;
use warp::Rejection;

use super::error::ApiError;
use crate::services::calculator::{self, CalculatorRequest, FormFields, FormLayout};
use crate::services::{csv_export, pdf_export};
use crate::state::AppState;

/// Validates an export form the same way the calculator does, but rejects outright.
fn parse_export_form(fields: &FormFields, layout: FormLayout) -> Result<CalculatorRequest, Rejection> {
    calculator::check_export_preconditions(fields, layout).map_err(|e| {
        warn!("Export rejected: {}", e);
        warp::reject::custom(ApiError::bad_request(e.to_string()))
    })?;

    calculator::parse_request(fields, layout).map_err(|errors| {
        let message = errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(" ");
        warn!("Export rejected: {}", message);
        warp::reject::custom(ApiError::bad_request(message))
    })
}

fn attachment<B>(body: B, content_type: &str, filename: &str) -> Result<Response<B>, Rejection> {
    Response::builder()
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_DISPOSITION, format!("attachment; filename={}", filename))
        .body(body)
        .map_err(|e| {
            error!("Failed to build export response: {}", e);
            warp::reject::custom(ApiError::internal(e.to_string()))
        })
}

pub async fn export_csv(form: Vec<(String, String)>, state: Arc<AppState>) -> Result<Response<String>, Rejection> {
    let request = parse_export_form(&FormFields(form), FormLayout::CSV_EXPORT)?;
    info!("Exporting CSV for {:?}", request.tickers);

    let report = calculator::run_batch(state.provider.as_ref(), &request, state.ticker_delay).await;
    let body = csv_export::render(&report.outcomes).map_err(|e| {
        error!("CSV export failed: {}", e);
        warp::reject::custom(ApiError::internal(e.to_string()))
    })?;

    attachment(body, "text/csv", csv_export::FILENAME)
}

pub async fn export_pdf(form: Vec<(String, String)>, state: Arc<AppState>) -> Result<Response<Vec<u8>>, Rejection> {
    let request = parse_export_form(&FormFields(form), FormLayout::PDF_EXPORT)?;
    info!("Exporting PDF for {:?}", request.tickers);

    let report = calculator::run_batch(state.provider.as_ref(), &request, state.ticker_delay).await;
    let layout = pdf_export::build_report(&request, &report.outcomes);
    let body = tokio::task::spawn_blocking(move || pdf_export::render(&layout))
        .await
        .map_err(|e| warp::reject::custom(ApiError::internal(e.to_string())))?
        .map_err(|e| {
            error!("PDF export failed: {}", e);
            warp::reject::custom(ApiError::internal(e.to_string()))
        })?;

    attachment(body, "application/pdf", pdf_export::FILENAME)
}
