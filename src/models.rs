// src/models.rs
use serde::{Serialize, Deserialize};
use log::warn;

/// What an external market-data provider knows about one ticker.
/// Every numeric field may be missing; the engine falls back per field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub current_price: Option<f64>,
    pub dividend_yield_percent: Option<f64>,
    pub dividend_growth_rate_percent: Option<f64>,
    pub last_updated: String,
    pub long_name: Option<String>,
    /// Calendar year -> total dividends paid per share that year.
    pub annual_dividends: Vec<(i32, f64)>,
    /// `%Y-%m-%d` -> close price, oldest first.
    pub historical_prices: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutFrequency {
    Annual,
    SemiAnnual,
    Quarterly,
    Monthly,
}

impl PayoutFrequency {
    pub fn payouts_per_year(self) -> u32 {
        match self {
            PayoutFrequency::Annual => 1,
            PayoutFrequency::SemiAnnual => 2,
            PayoutFrequency::Quarterly => 4,
            PayoutFrequency::Monthly => 12,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PayoutFrequency::Annual => "Annual",
            PayoutFrequency::SemiAnnual => "Semi-Annual",
            PayoutFrequency::Quarterly => "Quarterly",
            PayoutFrequency::Monthly => "Monthly",
        }
    }

    /// Lenient parse of a form label. Anything unrecognised is treated as Annual.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "annual" | "annually" | "1" => PayoutFrequency::Annual,
            "semi-annual" | "semiannual" | "semi annual" | "2" => PayoutFrequency::SemiAnnual,
            "quarterly" | "4" => PayoutFrequency::Quarterly,
            "monthly" | "12" => PayoutFrequency::Monthly,
            other => {
                warn!("Unrecognised payout frequency '{}', defaulting to Annual", other);
                PayoutFrequency::Annual
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParams {
    pub initial_investment: f64,
    pub investment_years: u32,
    pub drip_enabled: bool,
    /// Used when the snapshot has no price, and always as the no-DRIP cost basis.
    pub initial_share_price: f64,
    pub dividend_yield_percent: f64,
    pub dividend_growth_rate_percent: f64,
    pub stock_growth_rate_percent: f64,
    pub payout_frequency: PayoutFrequency,
}

/// Where a resolved simulation input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Market,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolved<T> {
    pub value: T,
    pub source: Source,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedInputs {
    pub price: Resolved<f64>,
    /// Fractions, not percents.
    pub dividend_yield: Resolved<f64>,
    pub dividend_growth: Resolved<f64>,
    pub stock_growth: Resolved<f64>,
    pub starting_annual_dividend_per_share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayoutRecord {
    pub period: u32,
    pub stock_price: f64,
    pub dividend_per_share: f64,
    pub dividends: f64,
    pub shares_bought: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearRecord {
    pub year: u32,
    pub shares_start: f64,
    pub stock_price_start: f64,
    pub annual_dividend_per_share: f64,
    pub dividends_received: f64,
    pub shares_reinvested: f64,
    pub shares_end: f64,
    pub portfolio_value_end: f64,
    pub portfolio_value_no_drip_end: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub payouts: Vec<PayoutRecord>,
}

/// Chart.js style point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: u32,
    pub y: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChartSeries {
    pub portfolio_value: Vec<ChartPoint>,
    pub shares_owned: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub ticker: String,
    pub long_name: Option<String>,
    pub last_updated: String,
    /// Passed through from the snapshot for the dividend history chart.
    pub annual_dividends: Vec<(i32, f64)>,
    pub historical_prices: Vec<(String, f64)>,
    pub inputs: ResolvedInputs,
    pub payout_frequency: PayoutFrequency,
    pub drip_enabled: bool,
    pub initial_investment: f64,
    pub initial_shares: f64,
    pub starting_annual_dividend_per_share: f64,
    pub yield_on_cost_percent: f64,
    pub final_shares_with_drip: f64,
    pub final_value_with_drip: f64,
    pub final_shares_no_drip: f64,
    /// Closed-form recomputation after the loop.
    pub final_value_no_drip: f64,
    pub total_dividends_drip: f64,
    pub total_dividends_no_drip: f64,
    pub yearly_breakdown: Vec<YearRecord>,
    pub chart: ChartSeries,
}

#[derive(Debug, Clone, Serialize)]
pub enum SimulationOutcome {
    Projected(Box<SimulationResult>),
    NoDividend {
        ticker: String,
        effective_price: f64,
        last_updated: String,
    },
    InvalidPrice {
        ticker: String,
        price: f64,
    },
}

/// Latest dashboard quote for one symbol. Prices are pre-formatted to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardQuote {
    pub symbol: String,
    pub company_name: String,
    pub logo: String,
    pub current_price: String,
    pub high_price: String,
    pub low_price: String,
    pub open_price: String,
    pub prev_close_price: String,
    pub change: String,
    pub percentage_change: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payout_labels_parse_leniently() {
        assert_eq!(PayoutFrequency::from_label("Quarterly"), PayoutFrequency::Quarterly);
        assert_eq!(PayoutFrequency::from_label("semi-annual"), PayoutFrequency::SemiAnnual);
        assert_eq!(PayoutFrequency::from_label(" MONTHLY "), PayoutFrequency::Monthly);
        assert_eq!(PayoutFrequency::from_label("12"), PayoutFrequency::Monthly);
        assert_eq!(PayoutFrequency::from_label("weekly"), PayoutFrequency::Annual);
        assert_eq!(PayoutFrequency::from_label(""), PayoutFrequency::Annual);
    }

    #[test]
    fn payout_counts() {
        let counts: Vec<u32> = [
            PayoutFrequency::Annual,
            PayoutFrequency::SemiAnnual,
            PayoutFrequency::Quarterly,
            PayoutFrequency::Monthly,
        ]
        .iter()
        .map(|f| f.payouts_per_year())
        .collect();
        assert_eq!(counts, vec![1, 2, 4, 12]);
    }
}
