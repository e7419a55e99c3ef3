// src/services/drip.rs
//! Dividend reinvestment projection.
//!
//! `simulate` is the only entry point. It performs no I/O and reads no clock,
//! so the calculator view and both exporters get identical numbers for
//! identical inputs.

use log::debug;

use crate::models::{
    ChartPoint, ChartSeries, MarketSnapshot, PayoutRecord, Resolved, ResolvedInputs,
    SimulationOutcome, SimulationParams, SimulationResult, Source, YearRecord,
};

fn resolve(market: Option<f64>, fallback: f64) -> Resolved<f64> {
    match market {
        Some(value) => Resolved { value, source: Source::Market },
        None => Resolved { value: fallback, source: Source::Fallback },
    }
}

/// Picks each effective input from the snapshot when present, otherwise from the params.
/// Stock growth has no market source and is always the user-supplied value.
pub fn resolve_inputs(snapshot: &MarketSnapshot, params: &SimulationParams) -> ResolvedInputs {
    let price = resolve(snapshot.current_price, params.initial_share_price);
    let dividend_yield = resolve(
        snapshot.dividend_yield_percent.map(|p| p / 100.0),
        params.dividend_yield_percent / 100.0,
    );
    let dividend_growth = resolve(
        snapshot.dividend_growth_rate_percent.map(|p| p / 100.0),
        params.dividend_growth_rate_percent / 100.0,
    );
    let stock_growth = Resolved {
        value: params.stock_growth_rate_percent / 100.0,
        source: Source::Fallback,
    };

    ResolvedInputs {
        starting_annual_dividend_per_share: price.value * dividend_yield.value,
        price,
        dividend_yield,
        dividend_growth,
        stock_growth,
    }
}

/// Converts an annual growth fraction to the equivalent per-period compounding rate.
pub fn period_rate(annual: f64, periods: u32) -> f64 {
    (1.0 + annual).powf(1.0 / periods as f64) - 1.0
}

pub fn simulate(ticker: &str, snapshot: &MarketSnapshot, params: &SimulationParams) -> SimulationOutcome {
    let inputs = resolve_inputs(snapshot, params);
    let effective_price = inputs.price.value;

    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !positive(effective_price) || !positive(params.initial_share_price) || !positive(params.initial_investment) {
        return SimulationOutcome::InvalidPrice {
            ticker: ticker.to_string(),
            price: effective_price,
        };
    }

    let starting_dps = inputs.starting_annual_dividend_per_share;
    if !(starting_dps > 0.0) {
        return SimulationOutcome::NoDividend {
            ticker: ticker.to_string(),
            effective_price,
            last_updated: snapshot.last_updated.clone(),
        };
    }

    let stock_growth = inputs.stock_growth.value;
    let dividend_growth = inputs.dividend_growth.value;
    let initial_investment = params.initial_investment;
    let initial_shares = initial_investment / effective_price;
    // No-DRIP valuation uses the user-entered price as the cost basis.
    let nominal_shares_no_drip = initial_investment / params.initial_share_price;

    let payouts = params.payout_frequency.payouts_per_year();
    let period_stock_rate = period_rate(stock_growth, payouts);
    let period_dividend_rate = period_rate(dividend_growth, payouts);

    debug!(
        "Simulating {} for {} years, {} payouts/year (period stock rate {:.4}, period dividend rate {:.4})",
        ticker, params.investment_years, payouts, period_stock_rate, period_dividend_rate
    );

    let mut shares_drip = initial_shares;
    let shares_no_drip = initial_shares;
    let mut stock_price = effective_price;
    let mut dividend_per_share = starting_dps;
    let mut total_dividends_drip = 0.0;
    let mut total_dividends_no_drip = 0.0;

    let mut yearly_breakdown = Vec::with_capacity(params.investment_years as usize);
    let mut chart = ChartSeries::default();
    chart.portfolio_value.push(ChartPoint { x: 0, y: initial_investment });
    chart.shares_owned.push(ChartPoint { x: 0, y: initial_shares });

    for year in 1..=params.investment_years {
        let shares_start = shares_drip;
        let price_start = stock_price;
        let dps_start = dividend_per_share;

        total_dividends_no_drip += shares_no_drip * dps_start;

        let mut dividends_received = 0.0;
        let mut shares_reinvested = 0.0;
        let mut payout_records = Vec::new();

        if params.drip_enabled {
            for i in 0..payouts {
                let period_price = price_start * (1.0 + period_stock_rate).powi(i as i32);
                let period_dps = (dps_start / payouts as f64) * (1.0 + period_dividend_rate).powi(i as i32);
                let dividends = shares_drip * period_dps;
                let shares_bought = if period_price > 0.0 { dividends / period_price } else { 0.0 };

                shares_drip += shares_bought;
                dividends_received += dividends;
                shares_reinvested += shares_bought;
                payout_records.push(PayoutRecord {
                    period: i + 1,
                    stock_price: period_price,
                    dividend_per_share: period_dps,
                    dividends,
                    shares_bought,
                });
            }
        } else {
            dividends_received = shares_start * dps_start;
        }
        total_dividends_drip += dividends_received;

        stock_price = price_start * (1.0 + stock_growth);
        dividend_per_share = dps_start * (1.0 + dividend_growth);

        let portfolio_value_end = shares_drip * stock_price;
        let portfolio_value_no_drip_end = nominal_shares_no_drip * stock_price + total_dividends_no_drip;

        chart.portfolio_value.push(ChartPoint { x: year, y: portfolio_value_end });
        chart.shares_owned.push(ChartPoint { x: year, y: shares_drip });

        yearly_breakdown.push(YearRecord {
            year,
            shares_start,
            stock_price_start: price_start,
            annual_dividend_per_share: dps_start,
            dividends_received,
            shares_reinvested,
            shares_end: shares_drip,
            portfolio_value_end,
            portfolio_value_no_drip_end,
            payouts: payout_records,
        });
    }

    let final_price = effective_price * (1.0 + stock_growth).powi(params.investment_years as i32);
    let final_value_no_drip = nominal_shares_no_drip * final_price + total_dividends_no_drip;
    let final_value_with_drip = yearly_breakdown
        .last()
        .map(|r| r.portfolio_value_end)
        .unwrap_or(initial_investment);

    SimulationOutcome::Projected(Box::new(SimulationResult {
        ticker: ticker.to_string(),
        long_name: snapshot.long_name.clone(),
        last_updated: snapshot.last_updated.clone(),
        annual_dividends: snapshot.annual_dividends.clone(),
        historical_prices: snapshot.historical_prices.clone(),
        payout_frequency: params.payout_frequency,
        drip_enabled: params.drip_enabled,
        initial_investment,
        initial_shares,
        starting_annual_dividend_per_share: starting_dps,
        yield_on_cost_percent: starting_dps / params.initial_share_price * 100.0,
        final_shares_with_drip: shares_drip,
        final_value_with_drip,
        final_shares_no_drip: nominal_shares_no_drip,
        final_value_no_drip,
        total_dividends_drip,
        total_dividends_no_drip,
        yearly_breakdown,
        chart,
        inputs,
    }))
}
