//! Market data access port trait.

use crate::domain::error::KomorebiError;
use crate::domain::price_series::PriceSeries;
use crate::domain::quote::{CompanyProfile, Quote};
use chrono::NaiveDate;

/// A source of daily closes, latest quotes and company profiles.
///
/// Implementations must be shareable across threads; the caching layer
/// may call them from several callers at once.
pub trait MarketDataPort: Send + Sync {
    /// Daily closes for `ticker` up to `end`. `start = None` asks for the
    /// full available history.
    fn fetch_price_history(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> Result<PriceSeries, KomorebiError>;

    fn fetch_quote(&self, ticker: &str) -> Result<Quote, KomorebiError>;

    fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, KomorebiError>;
}

impl<T: MarketDataPort + ?Sized> MarketDataPort for Box<T> {
    fn fetch_price_history(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> Result<PriceSeries, KomorebiError> {
        (**self).fetch_price_history(ticker, start, end)
    }

    fn fetch_quote(&self, ticker: &str) -> Result<Quote, KomorebiError> {
        (**self).fetch_quote(ticker)
    }

    fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, KomorebiError> {
        (**self).fetch_profile(ticker)
    }
}
