//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_report_adapter;
pub mod file_config_adapter;
pub mod market_data;
pub mod portfolio_file;
#[cfg(feature = "yahoo")]
pub mod yahoo_adapter;
