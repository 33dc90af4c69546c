//! Equal-weight buy-and-hold replay.
//!
//! Capital is split evenly across usable tickers on the first grid date,
//! converted to fractional share counts and held without rebalancing.

use crate::domain::calendar::common_grid;
use crate::domain::price_series::{NamedSeries, PriceSeries};
use crate::domain::universe::{screen, SkippedTicker};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const DEFAULT_CAPITAL: f64 = 1_000_000.0;
pub const TOTAL_SERIES_NAME: &str = "Portfolio Total";

#[derive(Debug, Clone, PartialEq)]
pub struct HoldingAllocation {
    pub ticker: String,
    pub shares: f64,
    pub invested: f64,
    pub start_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSummary {
    pub initial_capital: f64,
    pub final_value: f64,
    pub gain_loss: f64,
    pub percent: f64,
}

impl SimulationSummary {
    /// Summary of a value curve; an empty curve leaves the capital untouched.
    pub fn from_curve(initial_capital: f64, curve: &NamedSeries) -> Self {
        let final_value = curve.last().map_or(initial_capital, |p| p.value);
        let gain_loss = final_value - initial_capital;
        let percent = if initial_capital != 0.0 {
            gain_loss / initial_capital * 100.0
        } else {
            0.0
        };
        SimulationSummary {
            initial_capital,
            final_value,
            gain_loss,
            percent,
        }
    }

    pub fn is_gain(&self) -> bool {
        self.gain_loss >= 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub grid: Vec<NaiveDate>,
    pub portfolio_value: NamedSeries,
    /// Value curve of each position, keyed by ticker.
    pub holdings: BTreeMap<String, NamedSeries>,
    pub summary: SimulationSummary,
    pub allocations: Vec<HoldingAllocation>,
    pub skipped: Vec<SkippedTicker>,
}

impl SimulationResult {
    pub fn is_degenerate(&self) -> bool {
        self.allocations.is_empty()
    }
}

pub fn simulate(
    histories: &BTreeMap<String, PriceSeries>,
    capital: f64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> SimulationResult {
    let grid = common_grid(histories.values(), start, end);
    let screening = screen(histories, &grid);

    if screening.usable.is_empty() {
        let empty = NamedSeries::new(TOTAL_SERIES_NAME, Vec::new());
        return SimulationResult {
            summary: SimulationSummary::from_curve(capital, &empty),
            grid,
            portfolio_value: empty,
            holdings: BTreeMap::new(),
            allocations: Vec::new(),
            skipped: screening.skipped,
        };
    }

    let per_holding = capital / screening.usable_count() as f64;
    let mut total = vec![0.0; grid.len()];
    let mut holdings = BTreeMap::new();
    let mut allocations = Vec::with_capacity(screening.usable_count());

    for prices in &screening.usable {
        let start_price = prices.start_price();
        let shares = per_holding / start_price;
        let values: Vec<f64> = prices.closes.iter().map(|c| c * shares).collect();
        for (acc, v) in total.iter_mut().zip(&values) {
            *acc += v;
        }
        holdings.insert(
            prices.ticker.clone(),
            NamedSeries::from_grid(prices.ticker.as_str(), &grid, &values),
        );
        allocations.push(HoldingAllocation {
            ticker: prices.ticker.clone(),
            shares,
            invested: per_holding,
            start_price,
        });
    }

    let portfolio_value = NamedSeries::from_grid(TOTAL_SERIES_NAME, &grid, &total);
    SimulationResult {
        summary: SimulationSummary::from_curve(capital, &portfolio_value),
        grid,
        portfolio_value,
        holdings,
        allocations,
        skipped: screening.skipped,
    }
}
