//! Household power predictor.
//!
//! Estimates instantaneous household power draw from a metering reading with a
//! pre-trained regression model, derives daily and monthly usage with the
//! monthly bill, and forecasts future monthly consumption with an ARIMA model
//! fitted on the historical metering data at startup.

pub mod api;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod forecast;
pub mod ml;
pub mod state;
pub mod telemetry;
