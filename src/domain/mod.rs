//! Core domain types and selection logic.

pub mod backtest;
pub mod clock;
pub mod coarse;
pub mod config;
pub mod config_validation;
pub mod engine;
pub mod error;
pub mod fine;
pub mod gate;
pub mod ohlcv;
pub mod reconciler;
pub mod security;
pub mod targets;
pub mod universe;
