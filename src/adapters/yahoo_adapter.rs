//! Yahoo Finance chart API provider.
//!
//! Histories, quotes and a minimal profile all come from the
//! `v8/finance/chart` endpoint. Sector and country are not part of that
//! payload, so profiles carry only the name and currency.

use crate::domain::error::KomorebiError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::domain::quote::{CompanyProfile, Quote};
use crate::ports::market_data_port::MarketDataPort;
use chrono::{DateTime, NaiveDate};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const BROWSER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: Option<String>,
    currency: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

pub struct YahooAdapter {
    client: Client,
}

impl YahooAdapter {
    pub fn new(timeout: Duration) -> Result<Self, KomorebiError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                KomorebiError::provider("*", format!("failed to create HTTP client: {e}"))
            })?;
        Ok(Self { client })
    }

    fn fetch_chart(&self, ticker: &str, query: &str) -> Result<ChartResult, KomorebiError> {
        let url = format!("{BASE_URL}/{ticker}?{query}");
        debug!(ticker, %url, "requesting chart");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| KomorebiError::provider(ticker, format!("request failed: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| KomorebiError::provider(ticker, format!("failed to read body: {e}")))?;
        if !status.is_success() {
            return Err(KomorebiError::provider(ticker, format!("HTTP {status}")));
        }
        parse_chart(ticker, &body)
    }
}

fn parse_chart(ticker: &str, body: &str) -> Result<ChartResult, KomorebiError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| KomorebiError::provider(ticker, format!("invalid JSON: {e}")))?;
    if let Some(err) = envelope.chart.error {
        return Err(KomorebiError::provider(
            ticker,
            format!(
                "{}: {}",
                err.code.as_deref().unwrap_or("unknown"),
                err.description.as_deref().unwrap_or("no description")
            ),
        ));
    }
    envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| KomorebiError::provider(ticker, "empty chart result"))
}

fn closes_of(result: &ChartResult) -> PriceSeries {
    let closes = result
        .indicators
        .as_ref()
        .and_then(|i| i.quote.first())
        .map(|q| q.close.as_slice())
        .unwrap_or(&[]);
    let points = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            // exchange-local calendar date
            let date = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0)?.date_naive();
            Some(PricePoint {
                date,
                close: close.unwrap_or(f64::NAN),
            })
        })
        .collect();
    PriceSeries::new(points)
}

fn unix_start(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

fn unix_end(date: NaiveDate) -> i64 {
    date.and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

impl MarketDataPort for YahooAdapter {
    fn fetch_price_history(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> Result<PriceSeries, KomorebiError> {
        let period1 = start.map_or(0, unix_start);
        let query = format!("period1={period1}&period2={}&interval=1d", unix_end(end));
        let result = self.fetch_chart(ticker, &query)?;
        Ok(closes_of(&result))
    }

    fn fetch_quote(&self, ticker: &str) -> Result<Quote, KomorebiError> {
        let result = self.fetch_chart(ticker, "interval=1d&range=5d")?;
        quote_of(ticker, &result)
    }

    fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, KomorebiError> {
        let result = self.fetch_chart(ticker, "interval=1d&range=1d")?;
        Ok(profile_of(ticker, &result))
    }
}

fn quote_of(ticker: &str, result: &ChartResult) -> Result<Quote, KomorebiError> {
    let meta = &result.meta;
    let current = meta
        .regular_market_price
        .or_else(|| closes_of(result).last_close())
        .ok_or_else(|| KomorebiError::provider(ticker, "no market price"))?;
    // chartPreviousClose predates the whole range; the prior daily bar is the last session
    let previous = meta
        .previous_close
        .or_else(|| prior_close(&closes_of(result)))
        .or(meta.chart_previous_close)
        .unwrap_or(0.0);
    Ok(Quote::new(current, previous))
}

/// Second-to-last finite close.
fn prior_close(series: &PriceSeries) -> Option<f64> {
    series
        .points()
        .iter()
        .rev()
        .map(|p| p.close)
        .filter(|c| c.is_finite())
        .nth(1)
}

fn profile_of(ticker: &str, result: &ChartResult) -> CompanyProfile {
    let meta = &result.meta;
    let mut profile = CompanyProfile::unavailable(ticker);
    if let Some(name) = meta.long_name.clone().or_else(|| meta.short_name.clone()) {
        profile.long_name = name;
    }
    if let Some(currency) = &meta.currency {
        profile.currency = currency.clone();
    }
    if let Some(symbol) = &meta.symbol {
        profile.ticker = symbol.clone();
    }
    profile
}
