//! CSV file market data adapter.
//!
//! Layout under the base directory:
//! - `{ticker}.csv` with a `date` column and a `close` (or `adj close`) column
//! - `profiles.csv` with one row per ticker:
//!   `ticker,long_name,sector,industry,country,currency,pe_ratio,eps,market_cap,dividend_yield`
//!
//! Quotes are derived from the last two closes of the price file.

use crate::domain::error::KomorebiError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::domain::quote::{CompanyProfile, Quote};
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub const PROFILES_FILE: &str = "profiles.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}.csv"))
    }

    fn data_error(path: &Path, reason: impl Into<String>) -> KomorebiError {
        KomorebiError::DataFile {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    fn read_closes(&self, ticker: &str) -> Result<Vec<PricePoint>, KomorebiError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path)
            .map_err(|e| Self::data_error(&path, format!("failed to read: {e}")))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| Self::data_error(&path, format!("CSV parse error: {e}")))?
            .clone();
        let column = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let date_col =
            column(&["date"]).ok_or_else(|| Self::data_error(&path, "missing date column"))?;
        let close_col = column(&["close", "adj close", "adj_close"])
            .ok_or_else(|| Self::data_error(&path, "missing close column"))?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record =
                result.map_err(|e| Self::data_error(&path, format!("CSV parse error: {e}")))?;
            let date_str = record.get(date_col).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                Self::data_error(&path, format!("invalid date '{date_str}': {e}"))
            })?;
            // Blank or unparsable closes are gaps, not errors.
            let close = record
                .get(close_col)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN);
            points.push(PricePoint { date, close });
        }
        Ok(points)
    }

    fn read_profile_row(&self, ticker: &str) -> Result<Option<CompanyProfile>, KomorebiError> {
        let path = self.base_path.join(PROFILES_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let mut rdr = csv::Reader::from_path(&path)
            .map_err(|e| Self::data_error(&path, format!("failed to read: {e}")))?;
        let headers = rdr
            .headers()
            .map_err(|e| Self::data_error(&path, format!("CSV parse error: {e}")))?
            .clone();

        for result in rdr.records() {
            let record =
                result.map_err(|e| Self::data_error(&path, format!("CSV parse error: {e}")))?;
            let field = |name: &str| {
                headers
                    .iter()
                    .position(|h| h.trim().eq_ignore_ascii_case(name))
                    .and_then(|i| record.get(i))
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
            };
            if field("ticker") != Some(ticker) {
                continue;
            }
            let number = |name: &str| field(name).and_then(|v| v.parse::<f64>().ok());
            let mut profile = CompanyProfile::unavailable(ticker);
            if let Some(v) = field("long_name") {
                profile.long_name = v.to_string();
            }
            if let Some(v) = field("sector") {
                profile.sector = v.to_string();
            }
            if let Some(v) = field("industry") {
                profile.industry = v.to_string();
            }
            if let Some(v) = field("country") {
                profile.country = v.to_string();
            }
            if let Some(v) = field("currency") {
                profile.currency = v.to_string();
            }
            profile.pe_ratio = number("pe_ratio");
            profile.eps = number("eps");
            profile.market_cap = number("market_cap");
            profile.dividend_yield = number("dividend_yield");
            return Ok(Some(profile));
        }
        Ok(None)
    }
}

impl MarketDataPort for CsvAdapter {
    fn fetch_price_history(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> Result<PriceSeries, KomorebiError> {
        let points = self
            .read_closes(ticker)?
            .into_iter()
            .filter(|p| p.date <= end && start.is_none_or(|s| p.date >= s))
            .collect();
        Ok(PriceSeries::new(points))
    }

    fn fetch_quote(&self, ticker: &str) -> Result<Quote, KomorebiError> {
        let series = PriceSeries::new(self.read_closes(ticker)?);
        let mut closes = series
            .points()
            .iter()
            .rev()
            .map(|p| p.close)
            .filter(|c| c.is_finite());
        match (closes.next(), closes.next()) {
            (Some(current), Some(previous)) => Ok(Quote::new(current, previous)),
            (Some(current), None) => Ok(Quote::new(current, current)),
            _ => Err(KomorebiError::provider(ticker, "no closes available")),
        }
    }

    fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, KomorebiError> {
        self.read_profile_row(ticker)?
            .ok_or_else(|| KomorebiError::provider(ticker, "no profile row"))
    }
}
