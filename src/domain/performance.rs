//! Per-holding period statistics and top contributors.

use crate::domain::price_series::PriceSeries;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct HoldingPerformance {
    pub ticker: String,
    pub name: String,
    pub start_price: f64,
    pub end_price: f64,
    pub abs_change: f64,
    pub pct_change: f64,
}

impl HoldingPerformance {
    pub fn compute(
        ticker: &str,
        name: &str,
        series: &PriceSeries,
        start: NaiveDate,
    ) -> Option<Self> {
        let start_price = series.close_nearest(start)?;
        let end_price = series.last_close()?;
        if start_price <= 0.0 {
            return None;
        }
        let abs_change = end_price - start_price;
        Some(HoldingPerformance {
            ticker: ticker.to_string(),
            name: name.to_string(),
            start_price,
            end_price,
            abs_change,
            pct_change: abs_change / start_price * 100.0,
        })
    }
}

/// Rows for every history with a positive price near `start`. Names fall
/// back to the ticker.
pub fn holding_performance(
    histories: &BTreeMap<String, PriceSeries>,
    names: &HashMap<String, String>,
    start: NaiveDate,
) -> Vec<HoldingPerformance> {
    histories
        .iter()
        .filter_map(|(ticker, series)| {
            let name = names.get(ticker).map_or(ticker.as_str(), |n| n.as_str());
            HoldingPerformance::compute(ticker, name, series, start)
        })
        .collect()
}

/// Best `n` rows by percent change (descending) and worst `n` (ascending).
pub fn top_contributors(
    rows: &[HoldingPerformance],
    n: usize,
) -> (Vec<HoldingPerformance>, Vec<HoldingPerformance>) {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.pct_change.total_cmp(&a.pct_change));
    let best: Vec<_> = sorted.iter().take(n).cloned().collect();
    let worst: Vec<_> = sorted.iter().rev().take(n).cloned().collect();
    (best, worst)
}

/// Percent change from the first close of `today`'s calendar year to the
/// latest close. 0 without data in that year.
pub fn ytd_change(series: &PriceSeries, today: NaiveDate) -> f64 {
    let Some(jan1) = NaiveDate::from_ymd_opt(today.year(), 1, 1) else {
        return 0.0;
    };
    let year = series.between(jan1, today);
    match (year.first_close(), year.last_close()) {
        (Some(first), Some(last)) if first != 0.0 => (last - first) / first * 100.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn histories() -> BTreeMap<String, PriceSeries> {
        let mut h = BTreeMap::new();
        h.insert(
            "GD".to_string(),
            PriceSeries::from_pairs([(d(1, 2), 250.0), (d(1, 10), 275.0)]),
        );
        h.insert(
            "SLB".to_string(),
            PriceSeries::from_pairs([(d(1, 2), 50.0), (d(1, 10), 45.0)]),
        );
        h.insert(
            "VIE.PA".to_string(),
            PriceSeries::from_pairs([(d(1, 2), 30.0), (d(1, 10), 31.5)]),
        );
        h.insert("EMPTY".to_string(), PriceSeries::empty());
        h
    }

    #[test]
    fn rows_for_non_empty_histories() {
        let names: HashMap<String, String> =
            [("GD".to_string(), "General Dynamics".to_string())].into();
        let rows = holding_performance(&histories(), &names, d(1, 1));
        assert_eq!(rows.len(), 3);
        let gd = rows.iter().find(|r| r.ticker == "GD").unwrap();
        assert_eq!(gd.name, "General Dynamics");
        assert_relative_eq!(gd.pct_change, 10.0);
        assert_relative_eq!(gd.abs_change, 25.0);
        let slb = rows.iter().find(|r| r.ticker == "SLB").unwrap();
        assert_eq!(slb.name, "SLB");
        assert_relative_eq!(slb.pct_change, -10.0);
    }

    #[test]
    fn non_positive_start_is_dropped() {
        let s = PriceSeries::from_pairs([(d(1, 2), 0.0), (d(1, 3), 5.0)]);
        assert!(HoldingPerformance::compute("X", "X", &s, d(1, 2)).is_none());
    }

    #[test]
    fn contributors_sorted() {
        let rows = holding_performance(&histories(), &HashMap::new(), d(1, 2));
        let (best, worst) = top_contributors(&rows, 2);
        assert_eq!(best[0].ticker, "GD");
        assert_eq!(best[1].ticker, "VIE.PA");
        assert_eq!(worst[0].ticker, "SLB");
        assert_eq!(worst.len(), 2);
    }

    #[test]
    fn ytd_from_first_close_of_year() {
        let s = PriceSeries::from_pairs([
            (NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(), 80.0),
            (d(1, 2), 100.0),
            (d(3, 1), 120.0),
        ]);
        assert_relative_eq!(ytd_change(&s, d(3, 15)), 20.0);
        assert_eq!(ytd_change(&PriceSeries::empty(), d(3, 15)), 0.0);
    }
}
