//! Portfolio composition and participation weights.

use std::collections::{BTreeMap, HashMap, HashSet};

pub const DEFAULT_CURRENCY: &str = "$";

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioHolding {
    pub ticker: String,
    pub name: String,
    pub currency: String,
    /// Fraction of total capital. `None` means equal weight.
    pub weight: Option<f64>,
    pub sector: Option<String>,
    pub country: Option<String>,
    /// Manual dividend yield in percent; takes precedence over provider data.
    pub dividend_yield: Option<f64>,
}

impl PortfolioHolding {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>) -> Self {
        PortfolioHolding {
            ticker: ticker.into(),
            name: name.into(),
            currency: DEFAULT_CURRENCY.to_string(),
            weight: None,
            sector: None,
            country: None,
            dividend_yield: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Portfolio {
    pub holdings: Vec<PortfolioHolding>,
}

impl Portfolio {
    /// Builds a portfolio, rejecting duplicate tickers.
    pub fn new(holdings: Vec<PortfolioHolding>) -> Result<Self, String> {
        let mut seen = HashSet::new();
        for h in &holdings {
            if !seen.insert(h.ticker.as_str()) {
                return Err(format!("duplicate ticker: {}", h.ticker));
            }
        }
        Ok(Portfolio { holdings })
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn tickers(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.ticker.clone()).collect()
    }

    pub fn get(&self, ticker: &str) -> Option<&PortfolioHolding> {
        self.holdings.iter().find(|h| h.ticker == ticker)
    }

    pub fn display_name<'a>(&'a self, ticker: &'a str) -> &'a str {
        self.get(ticker).map_or(ticker, |h| h.name.as_str())
    }

    pub fn currency_of(&self, ticker: &str) -> &str {
        self.get(ticker).map_or(DEFAULT_CURRENCY, |h| h.currency.as_str())
    }

    pub fn names(&self) -> HashMap<String, String> {
        self.holdings
            .iter()
            .map(|h| (h.ticker.clone(), h.name.clone()))
            .collect()
    }

    /// Participation weights summing to 1. Equal weight unless every holding
    /// carries an explicit weight with a positive total.
    pub fn weights(&self) -> BTreeMap<String, f64> {
        let tickers = || self.holdings.iter().map(|h| h.ticker.as_str());
        let explicit: Option<Vec<f64>> = self.holdings.iter().map(|h| h.weight).collect();
        explicit
            .and_then(|ws| renormalize(tickers().zip(ws)))
            .unwrap_or_else(|| equal_weights(tickers()))
    }
}

pub fn equal_weights<'a, I>(tickers: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = &'a str>,
{
    let tickers: Vec<&str> = tickers.into_iter().collect();
    if tickers.is_empty() {
        return BTreeMap::new();
    }
    let w = 1.0 / tickers.len() as f64;
    tickers.into_iter().map(|t| (t.to_string(), w)).collect()
}

/// Scales weights to sum to 1. Negative or non-finite weights count as 0.
/// Returns `None` when nothing positive remains.
pub fn renormalize<'a, I>(weights: I) -> Option<BTreeMap<String, f64>>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let cleaned: Vec<(&str, f64)> = weights
        .into_iter()
        .map(|(t, w)| (t, if w.is_finite() && w > 0.0 { w } else { 0.0 }))
        .collect();
    let total: f64 = cleaned.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return None;
    }
    Some(
        cleaned
            .into_iter()
            .map(|(t, w)| (t.to_string(), w / total))
            .collect(),
    )
}
