//! Latest-quote snapshot and company profile data.

use crate::domain::allocation::UNKNOWN_LABEL;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quote {
    pub current_price: f64,
    pub previous_close: f64,
}

impl Quote {
    pub fn new(current_price: f64, previous_close: f64) -> Self {
        Quote {
            current_price,
            previous_close,
        }
    }

    /// All-zero quote substituted when the provider fails.
    pub fn neutral() -> Self {
        Quote::default()
    }

    pub fn change(&self) -> f64 {
        self.current_price - self.previous_close
    }

    /// Day change in percent, 0 without a previous close.
    pub fn percent_change(&self) -> f64 {
        if self.previous_close != 0.0 {
            self.change() / self.previous_close * 100.0
        } else {
            0.0
        }
    }

    pub fn is_up(&self) -> bool {
        self.change() >= 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyProfile {
    pub ticker: String,
    pub long_name: String,
    pub sector: String,
    pub industry: String,
    pub country: String,
    pub currency: String,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    /// Raw market capitalisation in the listing currency.
    pub market_cap: Option<f64>,
    /// Dividend yield in percent.
    pub dividend_yield: Option<f64>,
}

impl CompanyProfile {
    /// Profile substituted when the provider fails.
    pub fn unavailable(ticker: &str) -> Self {
        CompanyProfile {
            ticker: ticker.to_string(),
            long_name: ticker.to_string(),
            sector: UNKNOWN_LABEL.to_string(),
            industry: UNKNOWN_LABEL.to_string(),
            country: UNKNOWN_LABEL.to_string(),
            currency: String::new(),
            pe_ratio: None,
            eps: None,
            market_cap: None,
            dividend_yield: None,
        }
    }

    pub fn market_cap_billions(&self) -> Option<f64> {
        self.market_cap.map(|m| m / 1_000_000_000.0)
    }

    /// Manual yields win over provider data.
    pub fn with_dividend_override(mut self, manual: Option<f64>) -> Self {
        if manual.is_some() {
            self.dividend_yield = manual;
        }
        self
    }

    pub fn is_available(&self) -> bool {
        self.sector != UNKNOWN_LABEL || self.country != UNKNOWN_LABEL
    }
}
