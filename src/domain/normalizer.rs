//! Base-100 normalisation and the weighted portfolio index.
//!
//! Every included history is forward-filled onto the common business-day
//! grid and divided by its first grid price. The portfolio index is the
//! weight-sum of those curves; reference indices are normalised on the same
//! grid but never enter the sum.

use crate::domain::calendar::common_grid;
use crate::domain::error::InsufficientData;
use crate::domain::portfolio::{equal_weights, renormalize};
use crate::domain::price_series::{NamedSeries, NormalizedSeries, PriceSeries};
use crate::domain::universe::{screen, screen_one, GridPrices, SkippedTicker};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

pub const BASE: f64 = 100.0;
pub const PORTFOLIO_SERIES_NAME: &str = "Portfolio";

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioPerformance {
    pub grid: Vec<NaiveDate>,
    pub index: NamedSeries,
    /// Base-100 curve per included ticker.
    pub constituents: BTreeMap<String, NormalizedSeries>,
    /// Reference overlays keyed by display name.
    pub references: BTreeMap<String, NormalizedSeries>,
    /// Weights actually applied, summing to 1.
    pub weights: BTreeMap<String, f64>,
    pub skipped: Vec<SkippedTicker>,
}

impl PortfolioPerformance {
    pub fn final_index(&self) -> Option<f64> {
        self.index.last().map(|p| p.value)
    }
}

fn rebase(prices: &GridPrices) -> Vec<f64> {
    let start = prices.start_price();
    prices.closes.iter().map(|c| c / start * BASE).collect()
}

/// Base-100 curve of one series on `grid`, `None` when it cannot be anchored.
pub fn normalize(
    name: &str,
    series: &PriceSeries,
    grid: &[NaiveDate],
) -> Option<NormalizedSeries> {
    let prices = screen_one(name, series, grid).ok()?;
    Some(NamedSeries::from_grid(name, grid, &rebase(&prices)))
}

pub fn normalize_and_aggregate(
    histories: &BTreeMap<String, PriceSeries>,
    weights: Option<&BTreeMap<String, f64>>,
    references: &BTreeMap<String, PriceSeries>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<PortfolioPerformance, InsufficientData> {
    let grid = common_grid(histories.values(), start, end);
    let screening = screen(histories, &grid);
    if screening.usable.is_empty() {
        return Err(InsufficientData {
            requested: histories.len(),
        });
    }

    let applied = applied_weights(&screening.usable, weights);

    let mut index = vec![0.0; grid.len()];
    let mut constituents = BTreeMap::new();
    for prices in &screening.usable {
        let curve = rebase(prices);
        let w = applied.get(&prices.ticker).copied().unwrap_or(0.0);
        for (acc, v) in index.iter_mut().zip(&curve) {
            *acc += v * w;
        }
        constituents.insert(
            prices.ticker.clone(),
            NamedSeries::from_grid(prices.ticker.as_str(), &grid, &curve),
        );
    }

    // pin the first grid date at exactly BASE
    if let Some(&anchor) = index.first().filter(|a| **a > 0.0) {
        for v in index.iter_mut() {
            *v = *v / anchor * BASE;
        }
    }

    let mut overlays = BTreeMap::new();
    for (name, series) in references {
        match normalize(name, series, &grid) {
            Some(curve) => {
                overlays.insert(name.clone(), curve);
            }
            None => debug!(reference = %name, "omitting reference overlay"),
        }
    }

    Ok(PortfolioPerformance {
        index: NamedSeries::from_grid(PORTFOLIO_SERIES_NAME, &grid, &index),
        grid,
        constituents,
        references: overlays,
        weights: applied,
        skipped: screening.skipped,
    })
}

/// Explicit weights restricted to the included tickers and renormalised;
/// equal weight when none are given or none is positive.
fn applied_weights(
    usable: &[GridPrices],
    weights: Option<&BTreeMap<String, f64>>,
) -> BTreeMap<String, f64> {
    let tickers = || usable.iter().map(|p| p.ticker.as_str());
    weights
        .filter(|w| !w.is_empty())
        .and_then(|w| renormalize(tickers().map(|t| (t, w.get(t).copied().unwrap_or(0.0)))))
        .unwrap_or_else(|| equal_weights(tickers()))
}
