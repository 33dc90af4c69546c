#![allow(dead_code)]

use chrono::NaiveDate;
use komorebi::domain::error::KomorebiError;
pub use komorebi::domain::price_series::PriceSeries;
use komorebi::domain::quote::{CompanyProfile, Quote};
use komorebi::ports::market_data_port::MarketDataPort;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct MockMarketData {
    pub histories: HashMap<String, PriceSeries>,
    pub quotes: HashMap<String, Quote>,
    pub profiles: HashMap<String, CompanyProfile>,
    pub errors: HashMap<String, String>,
    pub history_calls: AtomicUsize,
    pub quote_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(mut self, ticker: &str, series: PriceSeries) -> Self {
        self.histories.insert(ticker.to_string(), series);
        self
    }

    pub fn with_closes(self, ticker: &str, closes: &[(&str, f64)]) -> Self {
        let series = PriceSeries::from_pairs(closes.iter().map(|(d, c)| (date(d), *c)));
        self.with_history(ticker, series)
    }

    pub fn with_quote(mut self, ticker: &str, current: f64, previous: f64) -> Self {
        self.quotes
            .insert(ticker.to_string(), Quote::new(current, previous));
        self
    }

    pub fn with_profile(mut self, ticker: &str, sector: &str, country: &str) -> Self {
        let mut profile = CompanyProfile::unavailable(ticker);
        profile.sector = sector.to_string();
        profile.country = country.to_string();
        self.profiles.insert(ticker.to_string(), profile);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    fn check(&self, ticker: &str) -> Result<(), KomorebiError> {
        match self.errors.get(ticker) {
            Some(reason) => Err(KomorebiError::provider(ticker, reason.clone())),
            None => Ok(()),
        }
    }
}

impl MarketDataPort for MockMarketData {
    fn fetch_price_history(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> Result<PriceSeries, KomorebiError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.check(ticker)?;
        let series = self.histories.get(ticker).cloned().unwrap_or_default();
        let from = start.unwrap_or(NaiveDate::MIN);
        Ok(series.between(from, end))
    }

    fn fetch_quote(&self, ticker: &str) -> Result<Quote, KomorebiError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.check(ticker)?;
        self.quotes
            .get(ticker)
            .copied()
            .ok_or_else(|| KomorebiError::provider(ticker, "no quote"))
    }

    fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, KomorebiError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.check(ticker)?;
        self.profiles
            .get(ticker)
            .cloned()
            .ok_or_else(|| KomorebiError::provider(ticker, "no profile"))
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Business days of the first week of 2024 (Mon 1st to Fri 5th).
pub fn week_closes(values: [f64; 5]) -> PriceSeries {
    PriceSeries::from_pairs(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (date("2024-01-01") + chrono::Days::new(i as u64), *v)),
    )
}
