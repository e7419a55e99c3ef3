// src/services/view.rs
//! Display model for the calculator page. Numbers are formatted here and
//! nowhere else, so the page shows exactly what the exporters compute.

use serde::Serialize;

use super::calculator::{BatchReport, CalculatorRequest, ComparisonRow, TickerOutcome};
use crate::models::{ChartSeries, SimulationResult, YearRecord};

/// `1234567.891` -> `1,234,567.89`
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// `1234.5` -> `$1,234.50`
pub fn format_money(value: f64) -> String {
    let formatted = format_number(value);
    match formatted.strip_prefix('-') {
        Some(rest) => format!("-${}", rest),
        None => format!("${}", formatted),
    }
}

pub fn format_percent(value: f64) -> String {
    format!("{}%", format_number(value))
}

#[derive(Debug, Serialize)]
pub struct YearRow {
    #[serde(rename = "Year")]
    pub year: u32,
    #[serde(rename = "Shares Owned (Start)")]
    pub shares_start: String,
    #[serde(rename = "Stock Price (Start)")]
    pub stock_price_start: String,
    #[serde(rename = "Annual Dividend Per Share")]
    pub annual_dividend_per_share: String,
    #[serde(rename = "Dividends Received (Year)")]
    pub dividends_received: String,
    #[serde(rename = "Reinvested Shares (Year)")]
    pub shares_reinvested: String,
    #[serde(rename = "Shares Owned (End)")]
    pub shares_end: String,
    #[serde(rename = "Portfolio Value (End)")]
    pub portfolio_value_end: String,
}

impl From<&YearRecord> for YearRow {
    fn from(r: &YearRecord) -> Self {
        YearRow {
            year: r.year,
            shares_start: format_number(r.shares_start),
            stock_price_start: format_money(r.stock_price_start),
            annual_dividend_per_share: format_money(r.annual_dividend_per_share),
            dividends_received: format_money(r.dividends_received),
            shares_reinvested: format_number(r.shares_reinvested),
            shares_end: format_number(r.shares_end),
            portfolio_value_end: format_money(r.portfolio_value_end),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultView {
    pub ticker: String,
    pub long_name: Option<String>,
    pub current_price: String,
    pub annual_dividend_per_share: Option<String>,
    pub dividend_yield: Option<String>,
    pub dividend_growth: Option<String>,
    pub initial_shares: Option<String>,
    pub final_value_no_drip: Option<String>,
    pub final_shares_no_drip: Option<String>,
    pub final_value_with_drip: Option<String>,
    pub final_shares_with_drip: Option<String>,
    pub yield_on_cost: Option<String>,
    pub payout_frequency: String,
    pub last_updated: String,
    pub yearly_breakdown: Vec<YearRow>,
    pub chart: Option<ChartSeries>,
    pub annual_dividends: Vec<(i32, f64)>,
    pub historical_prices: Vec<(String, f64)>,
    pub error: Option<String>,
}

impl ResultView {
    fn from_result(result: &SimulationResult) -> Self {
        ResultView {
            ticker: result.ticker.clone(),
            long_name: result.long_name.clone(),
            current_price: format_money(result.inputs.price.value),
            annual_dividend_per_share: Some(format_money(result.starting_annual_dividend_per_share)),
            dividend_yield: Some(format_percent(result.inputs.dividend_yield.value * 100.0)),
            dividend_growth: Some(format_percent(result.inputs.dividend_growth.value * 100.0)),
            initial_shares: Some(format_number(result.initial_shares)),
            final_value_no_drip: Some(format_money(result.final_value_no_drip)),
            final_shares_no_drip: Some(format_number(result.final_shares_no_drip)),
            final_value_with_drip: Some(format_money(result.final_value_with_drip)),
            final_shares_with_drip: Some(format_number(result.final_shares_with_drip)),
            yield_on_cost: Some(format_percent(result.yield_on_cost_percent)),
            payout_frequency: result.payout_frequency.label().to_string(),
            last_updated: result.last_updated.clone(),
            yearly_breakdown: result.yearly_breakdown.iter().map(YearRow::from).collect(),
            chart: Some(result.chart.clone()),
            annual_dividends: result.annual_dividends.clone(),
            historical_prices: result.historical_prices.clone(),
            error: None,
        }
    }

    fn from_outcome(outcome: &TickerOutcome, request: &CalculatorRequest) -> Self {
        match outcome {
            TickerOutcome::Simulated(result) => ResultView::from_result(result),
            TickerOutcome::Failed { ticker, error, current_price, last_updated } => ResultView {
                ticker: ticker.clone(),
                long_name: None,
                current_price: current_price.map(format_money).unwrap_or_else(|| "N/A".to_string()),
                annual_dividend_per_share: None,
                dividend_yield: None,
                dividend_growth: None,
                initial_shares: None,
                final_value_no_drip: None,
                final_shares_no_drip: None,
                final_value_with_drip: None,
                final_shares_with_drip: None,
                yield_on_cost: None,
                payout_frequency: request.params.payout_frequency.label().to_string(),
                last_updated: last_updated.clone().unwrap_or_else(|| "N/A".to_string()),
                yearly_breakdown: Vec::new(),
                chart: None,
                annual_dividends: Vec::new(),
                historical_prices: Vec::new(),
                error: Some(error.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ComparisonView {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Initial Investment")]
    pub initial_investment: String,
    #[serde(rename = "Initial Shares")]
    pub initial_shares: String,
    #[serde(rename = "Current Price")]
    pub current_price: String,
    #[serde(rename = "Annual Div per Share")]
    pub annual_dividend_per_share: String,
    #[serde(rename = "Dividend Yield")]
    pub dividend_yield: String,
    #[serde(rename = "Payout Frequency")]
    pub payout_frequency: String,
    #[serde(rename = "5-Yr Div Growth")]
    pub dividend_growth: String,
    #[serde(rename = "Final Value (No DRIP)")]
    pub final_value_no_drip: String,
    #[serde(rename = "Final Value (With DRIP)")]
    pub final_value_with_drip: String,
}

impl From<&ComparisonRow> for ComparisonView {
    fn from(row: &ComparisonRow) -> Self {
        ComparisonView {
            ticker: row.ticker.clone(),
            initial_investment: format_money(row.initial_investment),
            initial_shares: format_number(row.initial_shares),
            current_price: format_money(row.current_price),
            annual_dividend_per_share: format_money(row.annual_dividend_per_share),
            dividend_yield: format_percent(row.dividend_yield_percent),
            payout_frequency: row.payout_frequency.label().to_string(),
            dividend_growth: format_percent(row.dividend_growth_percent),
            final_value_no_drip: format_money(row.final_value_no_drip),
            final_value_with_drip: format_money(row.final_value_with_drip),
        }
    }
}

/// Echo of the form values so the page can re-populate its inputs.
#[derive(Debug, Serialize)]
pub struct FormEcho {
    pub selected_tickers: Vec<String>,
    pub initial_investment: f64,
    pub investment_years: u32,
    pub drip_enabled: String,
    pub initial_share_price: f64,
    pub dividend_yield: f64,
    pub annual_dividend_growth_rate: f64,
    pub annual_stock_price_growth_rate: f64,
    pub payout_frequency: String,
}

impl From<&CalculatorRequest> for FormEcho {
    fn from(request: &CalculatorRequest) -> Self {
        let p = &request.params;
        FormEcho {
            selected_tickers: request.tickers.clone(),
            initial_investment: p.initial_investment,
            investment_years: p.investment_years,
            drip_enabled: if p.drip_enabled { "yes" } else { "no" }.to_string(),
            initial_share_price: p.initial_share_price,
            dividend_yield: p.dividend_yield_percent,
            annual_dividend_growth_rate: p.dividend_growth_rate_percent,
            annual_stock_price_growth_rate: p.stock_growth_rate_percent,
            payout_frequency: p.payout_frequency.label().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CalculatorView {
    pub form: Option<FormEcho>,
    pub stock_symbols: Vec<String>,
    pub results: Vec<ResultView>,
    pub comparison_table: Option<Vec<ComparisonView>>,
    pub errors: Vec<String>,
}

impl CalculatorView {
    pub fn from_report(
        request: &CalculatorRequest,
        report: &BatchReport,
        stock_symbols: &[String],
    ) -> Self {
        let results = report
            .outcomes
            .iter()
            .map(|outcome| ResultView::from_outcome(outcome, request))
            .collect();

        CalculatorView {
            form: Some(FormEcho::from(request)),
            stock_symbols: stock_symbols.to_vec(),
            results,
            comparison_table: report
                .comparison
                .as_ref()
                .map(|rows| rows.iter().map(ComparisonView::from).collect()),
            errors: Vec::new(),
        }
    }

    pub fn defaults(stock_symbols: &[String]) -> Self {
        CalculatorView {
            form: Some(FormEcho::from(&CalculatorRequest::default())),
            stock_symbols: stock_symbols.to_vec(),
            results: Vec::new(),
            comparison_table: None,
            errors: Vec::new(),
        }
    }

    pub fn rejected(errors: Vec<String>, stock_symbols: &[String]) -> Self {
        CalculatorView {
            form: None,
            stock_symbols: stock_symbols.to_vec(),
            results: Vec::new(),
            comparison_table: None,
            errors,
        }
    }
}
