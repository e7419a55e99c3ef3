// src/services/calculator.rs
//! Form handling and multi-ticker batches around the DRIP engine.

use log::{debug, error, info, warn};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Duration;

use super::drip::simulate;
use super::market_data::SnapshotProvider;
use crate::error::CalculatorError;
use crate::models::{MarketSnapshot, PayoutFrequency, SimulationOutcome, SimulationParams, SimulationResult};

pub const MAX_INVESTMENT_YEARS: u32 = 100;

/// Raw `application/x-www-form-urlencoded` pairs. Keys may repeat.
#[derive(Debug, Clone, Default)]
pub struct FormFields(pub Vec<(String, String)>);

impl FormFields {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .find(|v| !v.is_empty())
    }

    pub fn get_all(&self, key: &str) -> impl Iterator<Item = &str> {
        let key = key.to_string();
        self.0.iter().filter(move |(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.parse::<u32>().ok())
    }
}

/// Field naming of one of the three forms that submit calculator inputs.
#[derive(Debug, Clone, Copy)]
pub struct FormLayout {
    prefix: &'static str,
    suffix: &'static str,
    tickers_key: &'static str,
    payout_default: Option<PayoutFrequency>,
}

impl FormLayout {
    pub const CALCULATOR: FormLayout = FormLayout {
        prefix: "",
        suffix: "",
        tickers_key: "tickers",
        payout_default: None,
    };
    pub const CSV_EXPORT: FormLayout = FormLayout {
        prefix: "export_",
        suffix: "",
        tickers_key: "tickers_hidden",
        payout_default: Some(PayoutFrequency::Quarterly),
    };
    pub const PDF_EXPORT: FormLayout = FormLayout {
        prefix: "export_",
        suffix: "_pdf",
        tickers_key: "tickers_hidden",
        payout_default: Some(PayoutFrequency::Quarterly),
    };

    fn key(&self, name: &str) -> String {
        format!("{}{}{}", self.prefix, name, self.suffix)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalculatorRequest {
    pub tickers: Vec<String>,
    pub params: SimulationParams,
}

impl Default for CalculatorRequest {
    fn default() -> Self {
        CalculatorRequest {
            tickers: vec!["NVDA".to_string()],
            params: SimulationParams {
                initial_investment: 10_000.0,
                investment_years: 10,
                drip_enabled: true,
                initial_share_price: 100.0,
                dividend_yield_percent: 2.5,
                dividend_growth_rate_percent: 5.0,
                stock_growth_rate_percent: 7.0,
                payout_frequency: PayoutFrequency::Quarterly,
            },
        }
    }
}

/// Upper-cases, trims and de-duplicates ticker input. Accepts repeated fields and comma lists.
pub fn normalize_tickers<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for symbol in raw.into_iter().flat_map(|v| v.split(',')) {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() && !tickers.contains(&symbol) {
            tickers.push(symbol);
        }
    }
    tickers
}

pub fn is_valid_ticker(symbol: &str) -> bool {
    static TICKER: OnceLock<Regex> = OnceLock::new();
    TICKER
        .get_or_init(|| Regex::new(r"^[A-Z0-9.^=\-]{1,12}$").expect("ticker pattern is valid"))
        .is_match(symbol)
}

/// Export forms must at least name the tickers, the amount and the duration.
pub fn check_export_preconditions(fields: &FormFields, layout: FormLayout) -> Result<(), CalculatorError> {
    let mut missing = Vec::new();
    if normalize_tickers(fields.get_all(&layout.key(layout.tickers_key))).is_empty() {
        missing.push("tickers");
    }
    if fields.get_f64(&layout.key("initial_investment")).is_none() {
        missing.push("initial_investment");
    }
    if fields.get_u32(&layout.key("investment_years")).is_none() {
        missing.push("investment_years");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CalculatorError::ExportPrecondition { missing })
    }
}

/// Parses and validates a submitted form, reporting every bad field at once.
pub fn parse_request(fields: &FormFields, layout: FormLayout) -> Result<CalculatorRequest, Vec<CalculatorError>> {
    let mut errors = Vec::new();

    let initial_investment = fields.get_f64(&layout.key("initial_investment"));
    if !initial_investment.is_some_and(|v| v > 0.0) {
        errors.push(CalculatorError::invalid(
            "initial_investment",
            "Please provide a positive initial investment.",
        ));
    }

    let investment_years = fields.get_u32(&layout.key("investment_years"));
    match investment_years {
        Some(years) if years > MAX_INVESTMENT_YEARS => errors.push(CalculatorError::invalid(
            "investment_years",
            format!("Investment duration cannot exceed {} years.", MAX_INVESTMENT_YEARS),
        )),
        Some(years) if years > 0 => {}
        _ => errors.push(CalculatorError::invalid(
            "investment_years",
            "Please provide a positive investment duration.",
        )),
    }

    let tickers = normalize_tickers(fields.get_all(&layout.key(layout.tickers_key)));
    if tickers.is_empty() {
        errors.push(CalculatorError::invalid("tickers", "Please select at least one ticker symbol."));
    }

    let initial_share_price = fields.get_f64(&layout.key("initial_share_price"));
    if !initial_share_price.is_some_and(|v| v > 0.0) {
        errors.push(CalculatorError::invalid(
            "initial_share_price",
            "Please provide a positive initial share price.",
        ));
    }

    let dividend_yield = fields.get_f64(&layout.key("dividend_yield"));
    if !dividend_yield.is_some_and(|v| v >= 0.0) {
        errors.push(CalculatorError::invalid(
            "dividend_yield",
            "Please provide a non-negative dividend yield.",
        ));
    }

    let mut growth_rate = |name: &'static str, label: &str| {
        let value = fields.get_f64(&layout.key(name));
        match value {
            None => errors.push(CalculatorError::invalid(name, format!("Please provide an {}.", label))),
            Some(v) if v <= -100.0 => errors.push(CalculatorError::invalid(
                name,
                format!("The {} must be greater than -100%.", label),
            )),
            Some(_) => {}
        }
        value
    };
    let dividend_growth = growth_rate("annual_dividend_growth_rate", "annual dividend growth rate");
    let stock_growth = growth_rate("annual_stock_price_growth_rate", "annual stock price growth rate");

    let payout_frequency = fields
        .get(&layout.key("payout_frequency"))
        .map(PayoutFrequency::from_label)
        .or(layout.payout_default);
    if payout_frequency.is_none() {
        errors.push(CalculatorError::invalid(
            "payout_frequency",
            "Please select a dividend payout frequency.",
        ));
    }

    let drip_enabled = fields
        .get(&layout.key("drip_enabled"))
        .is_some_and(|v| v.eq_ignore_ascii_case("yes") || v.eq_ignore_ascii_case("on"));

    match (
        initial_investment,
        investment_years,
        initial_share_price,
        dividend_yield,
        dividend_growth,
        stock_growth,
        payout_frequency,
    ) {
        (Some(amount), Some(years), Some(price), Some(yield_pct), Some(div_growth), Some(stock_growth), Some(freq))
            if errors.is_empty() =>
        {
            Ok(CalculatorRequest {
                tickers,
                params: SimulationParams {
                    initial_investment: amount,
                    investment_years: years,
                    drip_enabled,
                    initial_share_price: price,
                    dividend_yield_percent: yield_pct,
                    dividend_growth_rate_percent: div_growth,
                    stock_growth_rate_percent: stock_growth,
                    payout_frequency: freq,
                },
            })
        }
        _ => Err(errors),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TickerOutcome {
    Simulated(Box<SimulationResult>),
    Failed {
        ticker: String,
        #[serde(serialize_with = "serialize_error")]
        error: CalculatorError,
        current_price: Option<f64>,
        last_updated: Option<String>,
    },
}

fn serialize_error<S: serde::Serializer>(error: &CalculatorError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}

impl TickerOutcome {
    pub fn ticker(&self) -> &str {
        match self {
            TickerOutcome::Simulated(result) => &result.ticker,
            TickerOutcome::Failed { ticker, .. } => ticker,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TickerOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    pub ticker: String,
    pub initial_investment: f64,
    pub initial_shares: f64,
    pub current_price: f64,
    pub annual_dividend_per_share: f64,
    pub dividend_yield_percent: f64,
    pub payout_frequency: PayoutFrequency,
    pub dividend_growth_percent: f64,
    pub final_value_no_drip: f64,
    pub final_value_with_drip: f64,
}

impl From<&SimulationResult> for ComparisonRow {
    fn from(result: &SimulationResult) -> Self {
        ComparisonRow {
            ticker: result.ticker.clone(),
            initial_investment: result.initial_investment,
            initial_shares: result.initial_shares,
            current_price: result.inputs.price.value,
            annual_dividend_per_share: result.starting_annual_dividend_per_share,
            dividend_yield_percent: result.inputs.dividend_yield.value * 100.0,
            payout_frequency: result.payout_frequency,
            dividend_growth_percent: result.inputs.dividend_growth.value * 100.0,
            final_value_no_drip: result.final_value_no_drip,
            final_value_with_drip: result.final_value_with_drip,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<TickerOutcome>,
    /// Only present for multi-ticker requests where every ticker succeeded.
    pub comparison: Option<Vec<ComparisonRow>>,
}

impl BatchReport {
    pub fn results(&self) -> impl Iterator<Item = &SimulationResult> {
        self.outcomes.iter().filter_map(|o| match o {
            TickerOutcome::Simulated(result) => Some(result.as_ref()),
            TickerOutcome::Failed { .. } => None,
        })
    }
}

/// Projection for a single ticker whose snapshot is already known.
pub fn simulate_ticker(ticker: &str, snapshot: &MarketSnapshot, params: &SimulationParams) -> TickerOutcome {
    match simulate(ticker, snapshot, params) {
        SimulationOutcome::Projected(result) => TickerOutcome::Simulated(result),
        SimulationOutcome::NoDividend { ticker, effective_price, last_updated } => {
            info!("{} pays no dividends, skipping projection", ticker);
            TickerOutcome::Failed {
                error: CalculatorError::NoDividendData { ticker: ticker.clone() },
                ticker,
                current_price: Some(effective_price),
                last_updated: Some(last_updated),
            }
        }
        SimulationOutcome::InvalidPrice { ticker, price } => {
            warn!("{} has unusable price {}, skipping projection", ticker, price);
            TickerOutcome::Failed {
                error: CalculatorError::invalid(
                    "initial_share_price",
                    format!("{}: initial share price is zero or invalid, cannot calculate. Please check inputs.", ticker),
                ),
                ticker,
                current_price: Some(price),
                last_updated: Some(snapshot.last_updated.clone()),
            }
        }
    }
}

/// Runs every requested ticker. A failing ticker is recorded and the batch carries on.
pub async fn run_batch(
    provider: &dyn SnapshotProvider,
    request: &CalculatorRequest,
    ticker_delay: Duration,
) -> BatchReport {
    let mut outcomes = Vec::with_capacity(request.tickers.len());

    for (i, ticker) in request.tickers.iter().enumerate() {
        if i > 0 && !ticker_delay.is_zero() {
            tokio::time::sleep(ticker_delay).await;
        }

        if !is_valid_ticker(ticker) {
            outcomes.push(TickerOutcome::Failed {
                ticker: ticker.clone(),
                error: CalculatorError::invalid("tickers", format!("'{}' is not a valid ticker symbol.", ticker)),
                current_price: None,
                last_updated: None,
            });
            continue;
        }

        debug!("Fetching snapshot for {}", ticker);
        let snapshot = match provider.fetch_snapshot(ticker).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Error fetching DRIP data for {}: {}", ticker, e);
                outcomes.push(TickerOutcome::Failed {
                    ticker: ticker.clone(),
                    error: CalculatorError::UpstreamDataUnavailable {
                        ticker: ticker.clone(),
                        reason: e.to_string(),
                    },
                    current_price: None,
                    last_updated: Some(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
                });
                continue;
            }
        };

        outcomes.push(simulate_ticker(ticker, &snapshot, &request.params));
    }

    let comparison = if request.tickers.len() > 1 && !outcomes.iter().any(TickerOutcome::is_failed) {
        Some(
            outcomes
                .iter()
                .filter_map(|o| match o {
                    TickerOutcome::Simulated(result) => Some(ComparisonRow::from(result.as_ref())),
                    TickerOutcome::Failed { .. } => None,
                })
                .collect(),
        )
    } else {
        None
    };

    BatchReport { outcomes, comparison }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoxError;
    use async_trait::async_trait;

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        FormFields(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    fn valid_form() -> Vec<(&'static str, &'static str)> {
        vec![
            ("initial_investment", "10000"),
            ("investment_years", "10"),
            ("drip_enabled", "yes"),
            ("tickers", "ko"),
            ("tickers", "PEP"),
            ("initial_share_price", "100"),
            ("dividend_yield", "2.5"),
            ("annual_dividend_growth_rate", "5"),
            ("annual_stock_price_growth_rate", "7"),
            ("payout_frequency", "Quarterly"),
        ]
    }

    struct StubProvider;

    #[async_trait]
    impl SnapshotProvider for StubProvider {
        async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, BoxError> {
            match symbol {
                "DOWN" => Err("connection refused".into()),
                "TSLA" => Ok(MarketSnapshot {
                    current_price: Some(200.0),
                    dividend_yield_percent: Some(0.0),
                    last_updated: "2024-06-30 12:00:00".into(),
                    ..Default::default()
                }),
                _ => Ok(MarketSnapshot {
                    current_price: Some(60.0),
                    dividend_yield_percent: Some(3.0),
                    dividend_growth_rate_percent: Some(4.0),
                    last_updated: "2024-06-30 12:00:00".into(),
                    ..Default::default()
                }),
            }
        }
    }

    fn request(tickers: &[&str]) -> CalculatorRequest {
        CalculatorRequest {
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn parses_valid_calculator_form() {
        let req = parse_request(&fields(&valid_form()), FormLayout::CALCULATOR).unwrap();
        assert_eq!(req.tickers, vec!["KO", "PEP"]);
        assert_eq!(req.params.investment_years, 10);
        assert!(req.params.drip_enabled);
        assert_eq!(req.params.payout_frequency, PayoutFrequency::Quarterly);
    }

    #[test]
    fn reports_every_invalid_field() {
        let form = fields(&[
            ("initial_investment", "-5"),
            ("investment_years", "0"),
            ("initial_share_price", "abc"),
            ("dividend_yield", "-1"),
            ("annual_stock_price_growth_rate", "-150"),
        ]);
        let errors = parse_request(&form, FormLayout::CALCULATOR).unwrap_err();
        let failed: Vec<&str> = errors
            .iter()
            .map(|e| match e {
                CalculatorError::InvalidInput { field, .. } => *field,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(
            failed,
            vec![
                "initial_investment",
                "investment_years",
                "tickers",
                "initial_share_price",
                "dividend_yield",
                "annual_dividend_growth_rate",
                "annual_stock_price_growth_rate",
                "payout_frequency",
            ]
        );
    }

    #[test]
    fn caps_investment_years() {
        let mut form = valid_form();
        form[1] = ("investment_years", "101");
        let errors = parse_request(&fields(&form), FormLayout::CALCULATOR).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("cannot exceed 100 years"));
    }

    #[test]
    fn unknown_frequency_falls_back_to_annual() {
        let mut form = valid_form();
        form[9] = ("payout_frequency", "Fortnightly");
        let req = parse_request(&fields(&form), FormLayout::CALCULATOR).unwrap();
        assert_eq!(req.params.payout_frequency, PayoutFrequency::Annual);
    }

    #[test]
    fn pdf_layout_reads_its_own_stock_growth_field() {
        let form = fields(&[
            ("export_tickers_hidden_pdf", "KO,pep"),
            ("export_initial_investment_pdf", "5000"),
            ("export_investment_years_pdf", "5"),
            ("export_drip_enabled_pdf", "no"),
            ("export_initial_share_price_pdf", "50"),
            ("export_dividend_yield_pdf", "3"),
            ("export_annual_dividend_growth_rate_pdf", "4"),
            ("export_annual_stock_price_growth_rate_pdf", "9"),
        ]);
        let req = parse_request(&form, FormLayout::PDF_EXPORT).unwrap();
        assert_eq!(req.tickers, vec!["KO", "PEP"]);
        assert_eq!(req.params.dividend_growth_rate_percent, 4.0);
        assert_eq!(req.params.stock_growth_rate_percent, 9.0);
        assert!(!req.params.drip_enabled);
        assert_eq!(req.params.payout_frequency, PayoutFrequency::Quarterly);
    }

    #[test]
    fn export_preconditions_name_missing_fields() {
        let form = fields(&[("export_investment_years", "10")]);
        match check_export_preconditions(&form, FormLayout::CSV_EXPORT) {
            Err(CalculatorError::ExportPrecondition { missing }) => {
                assert_eq!(missing, vec!["tickers", "initial_investment"]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let form = fields(&[
            ("export_tickers_hidden", "KO"),
            ("export_initial_investment", "1000"),
            ("export_investment_years", "10"),
        ]);
        assert!(check_export_preconditions(&form, FormLayout::CSV_EXPORT).is_ok());
    }

    #[test]
    fn ticker_normalization() {
        assert_eq!(normalize_tickers([" ko , pep", "", "KO", "brk.b"]), vec!["KO", "PEP", "BRK.B"]);
        assert!(is_valid_ticker("BRK.B"));
        assert!(is_valid_ticker("^GSPC"));
        assert!(!is_valid_ticker("DROP TABLE"));
        assert!(!is_valid_ticker(""));
    }

    #[tokio::test]
    async fn batch_continues_past_failures() {
        let report = run_batch(&StubProvider, &request(&["KO", "DOWN", "TSLA", "B@D"]), Duration::ZERO).await;

        let tickers: Vec<&str> = report.outcomes.iter().map(TickerOutcome::ticker).collect();
        assert_eq!(tickers, vec!["KO", "DOWN", "TSLA", "B@D"]);
        assert!(!report.outcomes[0].is_failed());
        assert!(matches!(
            &report.outcomes[1],
            TickerOutcome::Failed { error: CalculatorError::UpstreamDataUnavailable { .. }, .. }
        ));
        assert!(matches!(
            &report.outcomes[2],
            TickerOutcome::Failed { error: CalculatorError::NoDividendData { .. }, current_price: Some(p), .. } if *p == 200.0
        ));
        assert!(matches!(
            &report.outcomes[3],
            TickerOutcome::Failed { error: CalculatorError::InvalidInput { field: "tickers", .. }, .. }
        ));
        assert!(report.comparison.is_none());
        assert_eq!(report.results().count(), 1);
    }

    #[tokio::test]
    async fn comparison_only_when_all_succeed() {
        let report = run_batch(&StubProvider, &request(&["KO", "PEP"]), Duration::ZERO).await;
        let comparison = report.comparison.expect("comparison table");
        assert_eq!(comparison.len(), 2);
        assert_eq!(comparison[0].ticker, "KO");
        assert!((comparison[0].dividend_yield_percent - 3.0).abs() < 1e-9);
        assert!((comparison[0].current_price - 60.0).abs() < 1e-12);

        let single = run_batch(&StubProvider, &request(&["KO"]), Duration::ZERO).await;
        assert!(single.comparison.is_none());
    }
}
