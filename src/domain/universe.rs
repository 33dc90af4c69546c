//! Ticker universe parsing and per-ticker screening against the common grid.
//!
//! A ticker is usable when its history has a positive finite price on or
//! before the first grid date. Everything else is skipped with a reason
//! and never raises.

use crate::domain::price_series::PriceSeries;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

/// Splits a comma-separated ticker list. Tickers keep their case since
/// exchange suffixes such as `.PA` or `.SW` are significant.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_string();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

/// A ticker's closes forward-filled onto every grid date.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPrices {
    pub ticker: String,
    pub closes: Vec<f64>,
}

impl GridPrices {
    pub fn start_price(&self) -> f64 {
        self.closes[0]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    /// No finite price at all.
    EmptyHistory,
    /// History starts after the first grid date.
    NoPriceAtStart,
    /// Start price is zero or negative.
    NonPositiveStart,
    /// The common grid has no dates.
    EmptyGrid,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::EmptyHistory => "no price data",
            SkipReason::NoPriceAtStart => "no price at grid start",
            SkipReason::NonPositiveStart => "non-positive start price",
            SkipReason::EmptyGrid => "empty date grid",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Screening {
    pub usable: Vec<GridPrices>,
    pub skipped: Vec<SkippedTicker>,
}

impl Screening {
    pub fn usable_count(&self) -> usize {
        self.usable.len()
    }
}

pub fn screen_one(
    ticker: &str,
    series: &PriceSeries,
    grid: &[NaiveDate],
) -> Result<GridPrices, SkipReason> {
    if series.is_empty() {
        return Err(SkipReason::EmptyHistory);
    }
    if grid.is_empty() {
        return Err(SkipReason::EmptyGrid);
    }
    let filled = series.reindex_ffill(grid);
    let start = filled[0].ok_or(SkipReason::NoPriceAtStart)?;
    if start <= 0.0 {
        return Err(SkipReason::NonPositiveStart);
    }
    // the first grid date has a price, so forward-fill defines every later date
    let closes = filled.into_iter().map(|c| c.unwrap_or(start)).collect();
    Ok(GridPrices {
        ticker: ticker.to_string(),
        closes,
    })
}

/// Screens every history, preserving input order.
pub fn screen<'a, I>(histories: I, grid: &[NaiveDate]) -> Screening
where
    I: IntoIterator<Item = (&'a String, &'a PriceSeries)>,
{
    let mut screening = Screening::default();
    for (ticker, series) in histories {
        match screen_one(ticker, series, grid) {
            Ok(prices) => screening.usable.push(prices),
            Err(reason) => {
                debug!(ticker = %ticker, ?reason, "excluding ticker");
                screening.skipped.push(SkippedTicker {
                    ticker: ticker.clone(),
                    reason,
                });
            }
        }
    }
    screening
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_parse_tickers_basic() {
        let result = parse_tickers("GOOGL,ERF.PA,ROG.SW").unwrap();
        assert_eq!(result, vec!["GOOGL", "ERF.PA", "ROG.SW"]);
    }

    #[test]
    fn test_parse_tickers_with_whitespace() {
        let result = parse_tickers("  GD , RR.L ,VIE.PA").unwrap();
        assert_eq!(result, vec!["GD", "RR.L", "VIE.PA"]);
    }

    #[test]
    fn test_parse_tickers_empty_token() {
        let result = parse_tickers("GD,,SLB");
        assert!(matches!(result, Err(UniverseError::EmptyToken)));
    }

    #[test]
    fn test_parse_tickers_duplicate() {
        let result = parse_tickers("GD,SLB,GD");
        assert!(matches!(result, Err(UniverseError::DuplicateTicker(s)) if s == "GD"));
    }

    #[test]
    fn screen_one_fills_gaps() {
        let series = PriceSeries::from_pairs([(d(1), 50.0), (d(3), 55.0)]);
        let grid = vec![d(2), d(3), d(4)];
        let prices = screen_one("GD", &series, &grid).unwrap();
        assert_eq!(prices.closes, vec![50.0, 55.0, 55.0]);
        assert_eq!(prices.start_price(), 50.0);
    }

    #[test]
    fn screen_one_reasons() {
        let grid = vec![d(2), d(3)];
        assert_eq!(
            screen_one("A", &PriceSeries::empty(), &grid),
            Err(SkipReason::EmptyHistory)
        );
        let late = PriceSeries::from_pairs([(d(3), 10.0)]);
        assert_eq!(screen_one("A", &late, &grid), Err(SkipReason::NoPriceAtStart));
        let zero = PriceSeries::from_pairs([(d(2), 0.0), (d(3), 10.0)]);
        assert_eq!(screen_one("A", &zero, &grid), Err(SkipReason::NonPositiveStart));
        let ok = PriceSeries::from_pairs([(d(2), 10.0)]);
        assert_eq!(screen_one("A", &ok, &[]), Err(SkipReason::EmptyGrid));
    }

    #[test]
    fn screen_splits_usable_and_skipped() {
        let mut histories = BTreeMap::new();
        histories.insert("A".to_string(), PriceSeries::from_pairs([(d(2), 10.0)]));
        histories.insert("B".to_string(), PriceSeries::empty());
        let screening = screen(&histories, &[d(2)]);
        assert_eq!(screening.usable_count(), 1);
        assert_eq!(screening.usable[0].ticker, "A");
        assert_eq!(
            screening.skipped,
            vec![SkippedTicker {
                ticker: "B".into(),
                reason: SkipReason::EmptyHistory
            }]
        );
    }
}
