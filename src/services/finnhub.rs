// src/services/finnhub.rs
use chrono::Utc;
use log::info;
use reqwest::Client;
use serde::Deserialize;

use crate::models::DashboardQuote;
use crate::BoxError;

pub const DEFAULT_BASE_URL: &str = "https://finnhub.io";

#[derive(Debug, Deserialize)]
pub struct FinnhubQuote {
    pub c: Option<f64>,
    pub h: Option<f64>,
    pub l: Option<f64>,
    pub o: Option<f64>,
    pub pc: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FinnhubProfile {
    pub name: Option<String>,
    pub logo: Option<String>,
}

/// Builds the dashboard row for one symbol. `timestamp_ms` is the refresh time.
pub fn to_dashboard_quote(
    symbol: &str,
    quote: &FinnhubQuote,
    profile: &FinnhubProfile,
    timestamp_ms: i64,
) -> Result<DashboardQuote, BoxError> {
    let current = quote
        .c
        .ok_or_else(|| format!("No valid quote data for {}", symbol))?;
    let prev_close = quote.pc.unwrap_or(0.0);

    let change = current - prev_close;
    let percentage_change = if prev_close != 0.0 { change / prev_close * 100.0 } else { 0.0 };

    let fmt = |v: f64| format!("{:.2}", v);
    Ok(DashboardQuote {
        symbol: symbol.to_string(),
        company_name: profile
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| symbol.to_string()),
        logo: profile.logo.clone().unwrap_or_default(),
        current_price: fmt(current),
        high_price: fmt(quote.h.unwrap_or(0.0)),
        low_price: fmt(quote.l.unwrap_or(0.0)),
        open_price: fmt(quote.o.unwrap_or(0.0)),
        prev_close_price: fmt(prev_close),
        change: fmt(change),
        percentage_change: fmt(percentage_change),
        timestamp: timestamp_ms,
    })
}

pub struct FinnhubClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FinnhubClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        FinnhubClient {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub async fn fetch_quote(&self, symbol: &str) -> Result<DashboardQuote, BoxError> {
        let quote: FinnhubQuote = self
            .client
            .get(format!("{}/api/v1/quote", self.base_url))
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let profile: FinnhubProfile = self
            .client
            .get(format!("{}/api/v1/stock/profile2", self.base_url))
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let dashboard_quote = to_dashboard_quote(symbol, &quote, &profile, Utc::now().timestamp_millis())?;
        info!("Updated dashboard data for {} ({})", symbol, dashboard_quote.company_name);
        Ok(dashboard_quote)
    }
}
