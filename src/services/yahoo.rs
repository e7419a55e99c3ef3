// src/services/yahoo.rs
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use super::market_data::SnapshotProvider;
use crate::models::MarketSnapshot;
use crate::BoxError;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Option<ChartIndicators>,
    #[serde(default)]
    events: Option<ChartEvents>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
}

/// Yahoo leaves `null` gaps in the close series for bars with no trades.
#[derive(Debug, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    long_name: Option<String>,
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, DividendEvent>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compound annual growth between the first and last calendar years of the history.
/// Falls back to 0.0 when there is not enough data, matching the dashboard's display default.
pub fn dividend_cagr(annual_dividends: &[(i32, f64)]) -> f64 {
    let (Some(&(first_year, first)), Some(&(last_year, last))) =
        (annual_dividends.first(), annual_dividends.last())
    else {
        return 0.0;
    };
    let years = (last_year - first_year) as f64;
    if first > 0.0 && years > 0.0 {
        (last / first).powf(1.0 / years) - 1.0
    } else {
        0.0
    }
}

/// Turns a Yahoo v8 chart response into a snapshot. `now` anchors the trailing
/// yield window and the `last_updated` stamp.
pub fn parse_chart_response(symbol: &str, body: &str, now: DateTime<Utc>) -> Result<MarketSnapshot, BoxError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(err) = envelope.chart.error {
        return Err(format!("{} ({})", err.description, err.code).into());
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| format!("No information found for ticker: {}", symbol))?;

    let price = result.meta.regular_market_price.ok_or_else(|| {
        format!(
            "Current price data not available for {}. Data might be delayed or unavailable.",
            symbol
        )
    })?;

    let window_start = now - Duration::days(5 * 365);
    let trailing_start = now - Duration::days(365);

    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    let mut trailing_total = 0.0;
    for event in result.events.map(|e| e.dividends).unwrap_or_default().into_values() {
        let Some(paid_at) = DateTime::from_timestamp(event.date, 0) else {
            warn!("Skipping dividend with invalid timestamp {} for {}", event.date, symbol);
            continue;
        };
        if paid_at < window_start || paid_at > now {
            continue;
        }
        *by_year.entry(paid_at.year()).or_insert(0.0) += event.amount;
        if paid_at >= trailing_start {
            trailing_total += event.amount;
        }
    }
    let annual_dividends: Vec<(i32, f64)> = by_year.into_iter().collect();

    let closes = result
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .map(|q| q.close)
        .unwrap_or_default();
    let historical_prices: Vec<(String, f64)> = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&at, close)| {
            let date = DateTime::from_timestamp(at, 0)?;
            Some((date.format("%Y-%m-%d").to_string(), round2(close?)))
        })
        .collect();

    let dividend_yield = if price > 0.0 { trailing_total / price * 100.0 } else { 0.0 };
    let growth = dividend_cagr(&annual_dividends) * 100.0;

    debug!(
        "{}: price {}, trailing dividends {}, {} dividend years, {} price points",
        symbol,
        price,
        trailing_total,
        annual_dividends.len(),
        historical_prices.len()
    );

    Ok(MarketSnapshot {
        current_price: Some(price),
        dividend_yield_percent: Some(round2(dividend_yield)),
        dividend_growth_rate_percent: Some(round2(growth)),
        last_updated: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        long_name: result.meta.long_name.or(result.meta.short_name),
        annual_dividends,
        historical_prices,
    })
}

pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, BoxError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SnapshotProvider for YahooClient {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, BoxError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        info!("Fetching DRIP data from URL: {}", url);

        let resp = self
            .client
            .get(&url)
            .query(&[("range", "5y"), ("interval", "1mo"), ("events", "div")])
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            // Yahoo explains unknown symbols in the JSON body of a 404.
            if let Ok(envelope) = serde_json::from_str::<ChartEnvelope>(&body) {
                if let Some(err) = envelope.chart.error {
                    return Err(err.description.into());
                }
            }
            return Err(format!("HTTP {} from Yahoo for {}", status, symbol).into());
        }

        parse_chart_response(symbol, &body, Utc::now())
    }
}
