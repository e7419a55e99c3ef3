// src/error.rs
use thiserror::Error;

/// Failures reported back to the calculator user. Per-ticker variants carry the
/// symbol so one bad ticker never hides the rest of a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculatorError {
    #[error("{reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("{ticker} does not currently pay dividends. DRIP has no effect.")]
    NoDividendData { ticker: String },

    #[error("Failed to fetch data for {ticker}. Reason: {reason}. Please check the symbol or try again later.")]
    UpstreamDataUnavailable { ticker: String, reason: String },

    #[error("Missing data for export: {}. Please ensure all required fields are present.", .missing.join(", "))]
    ExportPrecondition { missing: Vec<&'static str> },
}

impl CalculatorError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        CalculatorError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}
