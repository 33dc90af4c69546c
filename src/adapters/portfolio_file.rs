//! Holdings file loader.
//!
//! CSV with header `name,ticker[,currency][,weight][,sector][,country][,dividend_yield]`.
//! Optional columns may be absent or left blank on individual rows.

use crate::domain::error::KomorebiError;
use crate::domain::portfolio::{DEFAULT_CURRENCY, Portfolio, PortfolioHolding};
use std::path::Path;

fn file_error(reason: impl Into<String>) -> KomorebiError {
    KomorebiError::PortfolioFile {
        reason: reason.into(),
    }
}

pub fn load_portfolio(path: &Path) -> Result<Portfolio, KomorebiError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| file_error(format!("failed to read {}: {e}", path.display())))?;
    parse_portfolio(&content)
}

pub fn parse_portfolio(content: &str) -> Result<Portfolio, KomorebiError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| file_error(format!("CSV parse error: {e}")))?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();
    let col = |name: &str| headers.iter().position(|h| h == name);
    let name_col = col("name").ok_or_else(|| file_error("missing name column"))?;
    let ticker_col = col("ticker").ok_or_else(|| file_error("missing ticker column"))?;
    let currency_col = col("currency");
    let weight_col = col("weight");
    let sector_col = col("sector");
    let country_col = col("country");
    let yield_col = col("dividend_yield");

    let mut holdings = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let line = row + 2;
        let record = result.map_err(|e| file_error(format!("line {line}: {e}")))?;
        let text = |c: Option<usize>| {
            c.and_then(|i| record.get(i))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let number = |c: Option<usize>, field: &str| -> Result<Option<f64>, KomorebiError> {
            match text(c) {
                None => Ok(None),
                Some(v) => v
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| file_error(format!("line {line}: invalid {field} '{v}'"))),
            }
        };

        let ticker = text(Some(ticker_col))
            .ok_or_else(|| file_error(format!("line {line}: empty ticker")))?;
        let name = text(Some(name_col)).unwrap_or_else(|| ticker.clone());
        holdings.push(PortfolioHolding {
            ticker,
            name,
            currency: text(currency_col).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            weight: number(weight_col, "weight")?,
            sector: text(sector_col),
            country: text(country_col),
            dividend_yield: number(yield_col, "dividend_yield")?,
        });
    }

    if holdings.is_empty() {
        return Err(file_error("no holdings"));
    }
    Portfolio::new(holdings).map_err(file_error)
}
