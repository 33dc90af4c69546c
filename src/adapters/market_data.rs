//! In-memory memoisation of provider calls and the failure-absorbing
//! data-access boundary.
//!
//! Each provider function gets its own moka cache with its own TTL, so a
//! cache entry is keyed by (function, arguments). `try_get_with` runs one
//! initialiser per key while other callers for that key wait on it, and
//! errors are returned to every waiter without being stored.

use crate::domain::error::KomorebiError;
use crate::domain::price_series::PriceSeries;
use crate::domain::quote::{CompanyProfile, Quote};
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use moka::sync::Cache;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_QUOTE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_HISTORY_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_PROFILE_TTL: Duration = Duration::from_secs(86400);

const MAX_ENTRIES: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub quote: Duration,
    pub history: Duration,
    pub profile: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        CacheTtls {
            quote: DEFAULT_QUOTE_TTL,
            history: DEFAULT_HISTORY_TTL,
            profile: DEFAULT_PROFILE_TTL,
        }
    }
}

/// Arguments of one price-history request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub ticker: String,
    pub start: Option<NaiveDate>,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub history_count: u64,
    pub quote_count: u64,
    pub profile_count: u64,
}

impl CacheStats {
    pub fn total(&self) -> u64 {
        self.history_count + self.quote_count + self.profile_count
    }
}

pub struct MemoCache {
    histories: Cache<HistoryKey, PriceSeries>,
    quotes: Cache<String, Quote>,
    profiles: Cache<String, CompanyProfile>,
}

impl MemoCache {
    pub fn new(ttls: CacheTtls) -> Self {
        Self {
            histories: Cache::builder()
                .time_to_live(ttls.history)
                .max_capacity(MAX_ENTRIES)
                .build(),
            quotes: Cache::builder()
                .time_to_live(ttls.quote)
                .max_capacity(MAX_ENTRIES)
                .build(),
            profiles: Cache::builder()
                .time_to_live(ttls.profile)
                .max_capacity(MAX_ENTRIES)
                .build(),
        }
    }

    pub fn history<F>(&self, key: HistoryKey, init: F) -> Result<PriceSeries, Arc<KomorebiError>>
    where
        F: FnOnce() -> Result<PriceSeries, KomorebiError>,
    {
        self.histories.try_get_with(key, init)
    }

    pub fn quote<F>(&self, ticker: &str, init: F) -> Result<Quote, Arc<KomorebiError>>
    where
        F: FnOnce() -> Result<Quote, KomorebiError>,
    {
        self.quotes.try_get_with(ticker.to_string(), init)
    }

    pub fn profile<F>(&self, ticker: &str, init: F) -> Result<CompanyProfile, Arc<KomorebiError>>
    where
        F: FnOnce() -> Result<CompanyProfile, KomorebiError>,
    {
        self.profiles.try_get_with(ticker.to_string(), init)
    }

    pub fn invalidate_all(&self) {
        self.histories.invalidate_all();
        self.quotes.invalidate_all();
        self.profiles.invalidate_all();
    }

    /// Entry counts after flushing pending maintenance work.
    pub fn entry_counts(&self) -> CacheStats {
        self.histories.run_pending_tasks();
        self.quotes.run_pending_tasks();
        self.profiles.run_pending_tasks();
        CacheStats {
            history_count: self.histories.entry_count(),
            quote_count: self.quotes.entry_count(),
            profile_count: self.profiles.entry_count(),
        }
    }
}

impl Default for MemoCache {
    fn default() -> Self {
        Self::new(CacheTtls::default())
    }
}

/// Data access for the core: never fails, substitutes neutral values for
/// provider errors.
pub struct MarketData<P> {
    provider: P,
    cache: MemoCache,
}

impl<P: MarketDataPort> MarketData<P> {
    pub fn new(provider: P, ttls: CacheTtls) -> Self {
        Self {
            provider,
            cache: MemoCache::new(ttls),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn cache(&self) -> &MemoCache {
        &self.cache
    }

    pub fn get_price_history(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> PriceSeries {
        let key = HistoryKey {
            ticker: ticker.to_string(),
            start,
            end,
        };
        match self.cache.history(key, || {
            debug!(ticker, ?start, %end, "fetching price history");
            self.provider.fetch_price_history(ticker, start, end)
        }) {
            Ok(series) => series,
            Err(e) => {
                warn!(ticker, error = %e, "price history unavailable");
                PriceSeries::empty()
            }
        }
    }

    pub fn get_histories<S: AsRef<str>>(
        &self,
        tickers: &[S],
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> BTreeMap<String, PriceSeries> {
        tickers
            .iter()
            .map(|t| {
                let ticker = t.as_ref();
                (ticker.to_string(), self.get_price_history(ticker, start, end))
            })
            .collect()
    }

    pub fn get_quote(&self, ticker: &str) -> Quote {
        self.cache
            .quote(ticker, || self.provider.fetch_quote(ticker))
            .unwrap_or_else(|e| {
                warn!(ticker, error = %e, "quote unavailable");
                Quote::neutral()
            })
    }

    pub fn get_profile(&self, ticker: &str) -> CompanyProfile {
        self.cache
            .profile(ticker, || self.provider.fetch_profile(ticker))
            .unwrap_or_else(|e| {
                warn!(ticker, error = %e, "profile unavailable");
                CompanyProfile::unavailable(ticker)
            })
    }
}
