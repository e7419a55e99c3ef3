// Integration tests for the HTTP surface

mod common;

use common::{calculator_form, export_form, quote, test_state};
use drip_dashboard::routes::routes;
use drip_dashboard::services::quote_cache::QuoteStore;
use serde_json::Value;
use std::sync::Arc;
use warp::http::StatusCode;

const FORM: &str = "application/x-www-form-urlencoded";

#[tokio::test]
async fn test_stocks_returns_cached_quotes_by_symbol() {
    let store = Arc::new(QuoteStore::new());
    store.upsert(quote("PEP", "170.10"));
    store.upsert(quote("AAPL", "210.55"));
    let api = routes(test_state(store));

    let resp = warp::test::request().method("GET").path("/api/stocks").reply(&api).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    let quotes = body.as_object().unwrap();
    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes["AAPL"]["current_price"], "210.55");
    assert_eq!(quotes["PEP"]["company_name"], "PEP Inc.");
    assert!(!quotes.contains_key("KO"));
}

#[tokio::test]
async fn test_stocks_empty_before_first_refresh() {
    let api = routes(test_state(Arc::new(QuoteStore::new())));
    let resp = warp::test::request().method("GET").path("/api/stocks").reply(&api).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.body().as_ref(), b"{}");
}

#[tokio::test]
async fn test_calculator_defaults() {
    let api = routes(test_state(Arc::new(QuoteStore::new())));
    let resp = warp::test::request().method("GET").path("/api/v1/calculator").reply(&api).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body["form"]["selected_tickers"][0], "NVDA");
    assert_eq!(body["stock_symbols"].as_array().unwrap().len(), 3);
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_calculator_runs_batch_with_comparison() {
    let api = routes(test_state(Arc::new(QuoteStore::new())));
    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/calculator")
        .header("content-type", FORM)
        .body(calculator_form(&["ko", "PEP"]))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["ticker"], "KO");
    assert_eq!(results[0]["yield_on_cost"], "2.50%");
    assert_eq!(results[0]["yearly_breakdown"].as_array().unwrap().len(), 10);
    assert_eq!(results[0]["historical_prices"][1][0], "2024-06-01");
    assert_eq!(results[0]["historical_prices"][1][1], 100.0);
    assert_eq!(body["comparison_table"].as_array().unwrap().len(), 2);
    assert!(body["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_calculator_isolates_failing_ticker() {
    let api = routes(test_state(Arc::new(QuoteStore::new())));
    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/calculator")
        .header("content-type", FORM)
        .body(calculator_form(&["KO", "TSLA", "DOWN"]))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    let results = body["results"].as_array().unwrap();
    assert!(results[0]["error"].is_null());
    assert_eq!(
        results[1]["error"],
        "TSLA does not currently pay dividends. DRIP has no effect."
    );
    assert!(results[2]["error"].as_str().unwrap().starts_with("Failed to fetch data for DOWN."));
    assert!(body["comparison_table"].is_null());
}

#[tokio::test]
async fn test_calculator_rejects_invalid_form() {
    let api = routes(test_state(Arc::new(QuoteStore::new())));
    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/calculator")
        .header("content-type", FORM)
        .body("initial_investment=-1&tickers=KO")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e == "Please provide a positive initial investment."));
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_export_csv_attachment() {
    let api = routes(test_state(Arc::new(QuoteStore::new())));
    let resp = warp::test::request()
        .method("POST")
        .path("/export_csv")
        .header("content-type", FORM)
        .body(export_form("KO,PEP", ""))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "text/csv");
    assert_eq!(
        resp.headers()["content-disposition"],
        "attachment; filename=dividend_calculator_results.csv"
    );

    let body = String::from_utf8(resp.body().to_vec()).unwrap();
    // Header plus ten years for each ticker.
    assert_eq!(body.lines().count(), 21);
}

#[tokio::test]
async fn test_export_missing_fields_is_bad_request() {
    let api = routes(test_state(Arc::new(QuoteStore::new())));
    let resp = warp::test::request()
        .method("POST")
        .path("/export_csv")
        .header("content-type", FORM)
        .body("export_initial_investment=10000")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("tickers"));
    assert!(message.contains("investment_years"));
    assert!(!message.contains("initial_investment"));
}

#[tokio::test]
async fn test_bodiless_posts_are_bad_requests() {
    let api = routes(test_state(Arc::new(QuoteStore::new())));
    for path in ["/export_csv", "/export_pdf", "/api/v1/calculator"] {
        let resp = warp::test::request().method("POST").path(path).reply(&api).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", path);

        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Missing form data"), "{}", path);
    }
}

#[tokio::test]
async fn test_export_pdf_attachment() {
    let api = routes(test_state(Arc::new(QuoteStore::new())));
    let resp = warp::test::request()
        .method("POST")
        .path("/export_pdf")
        .header("content-type", FORM)
        .body(export_form("KO,TSLA", "_pdf"))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/pdf");
    assert!(resp.body().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_unknown_route_is_json_not_found() {
    let api = routes(test_state(Arc::new(QuoteStore::new())));
    let resp = warp::test::request().method("GET").path("/api/v1/nothing").reply(&api).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body["error"], "Not Found");
}
