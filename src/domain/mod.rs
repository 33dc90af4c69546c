//! Core domain types and logic.

pub mod error;
pub mod price_series;
pub mod calendar;
pub mod universe;
pub mod portfolio;
pub mod normalizer;
pub mod simulator;
pub mod allocation;
pub mod quote;
pub mod performance;
pub mod analysis;
pub mod config_validation;
