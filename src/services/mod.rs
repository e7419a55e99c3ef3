// src/services/mod.rs
pub mod calculator;
pub mod csv_export;
pub mod drip;
pub mod finnhub;
pub mod market_data;
pub mod pdf_export;
pub mod quote_cache;
pub mod view;
pub mod yahoo;
