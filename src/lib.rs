// src/lib.rs
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
