//! Core domain types and logic.

pub mod ohlcv;
pub mod position;
pub mod indicator;
pub mod indicator_helpers;
pub mod strategy;
pub mod backtest;
pub mod metrics;
pub mod compare;
pub mod optimizer;
pub mod config_validation;
pub mod error;
