//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - The wire model of the CWA `F-C0032-001` forecast dataset
//! - The parser that flattens per-element series into forecast records
//! - An abstraction over the forecast source, with an HTTP implementation
//! - A controller that runs one query at a time and publishes its state
//! - Configuration & credentials handling
//!
//! It is used by `forecast-cli`, but can also be reused by other front ends.

pub mod config;
pub mod controller;
pub mod model;
pub mod parser;
pub mod provider;

pub use config::Config;
pub use controller::{ForecastController, ForecastState, ViewStatus};
pub use model::{ForecastRecord, WeatherResponse};
pub use provider::{CwaProvider, FetchError, ForecastProvider};
