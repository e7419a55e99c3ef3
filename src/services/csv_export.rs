// src/services/csv_export.rs
use csv::Writer;
use log::info;

use super::calculator::TickerOutcome;
use crate::models::YearRecord;
use crate::BoxError;

pub const FILENAME: &str = "dividend_calculator_results.csv";

pub const HEADERS: [&str; 10] = [
    "Year",
    "Ticker",
    "Shares Owned (Start)",
    "Stock Price (Start)",
    "Annual Dividend Per Share",
    "Dividends Received (Year)",
    "Reinvested Shares (Year)",
    "Shares Owned (End)",
    "Portfolio Value (End)",
    "Error",
];

fn fixed2(value: f64) -> String {
    format!("{:.2}", value)
}

fn year_row(ticker: &str, r: &YearRecord) -> [String; 10] {
    [
        r.year.to_string(),
        ticker.to_string(),
        fixed2(r.shares_start),
        fixed2(r.stock_price_start),
        fixed2(r.annual_dividend_per_share),
        fixed2(r.dividends_received),
        fixed2(r.shares_reinvested),
        fixed2(r.shares_end),
        fixed2(r.portfolio_value_end),
        String::new(),
    ]
}

/// One row per ticker-year. A failed ticker gets a single row carrying its error.
pub fn render(outcomes: &[TickerOutcome]) -> Result<String, BoxError> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(HEADERS)?;

    let mut rows = 0;
    for outcome in outcomes {
        match outcome {
            TickerOutcome::Simulated(result) => {
                for record in &result.yearly_breakdown {
                    wtr.write_record(year_row(&result.ticker, record))?;
                    rows += 1;
                }
            }
            TickerOutcome::Failed { ticker, error, .. } => {
                let message = error.to_string();
                wtr.write_record(["", ticker.as_str(), "", "", "", "", "", "", "", message.as_str()])?;
                rows += 1;
            }
        }
    }

    let bytes = wtr.into_inner().map_err(|e| e.to_string())?;
    info!("Rendered CSV export with {} rows for {} tickers", rows, outcomes.len());
    Ok(String::from_utf8(bytes)?)
}
