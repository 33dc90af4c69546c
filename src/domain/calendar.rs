//! Business-day grid shared by the normaliser and the simulator.

use crate::domain::price_series::PriceSeries;
use chrono::{Datelike, NaiveDate, Weekday};

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday-to-Friday dates in `[start, end]`. Empty when `start > end`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_business_day(*d))
        .collect()
}

/// Bounds of the common grid: the latest first date across non-empty series
/// (unless `start` overrides it) up to `end` or the latest last date.
pub fn common_bounds<'a, I>(
    series: I,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Option<(NaiveDate, NaiveDate)>
where
    I: IntoIterator<Item = &'a PriceSeries>,
{
    let mut latest_first: Option<NaiveDate> = None;
    let mut latest_last: Option<NaiveDate> = None;
    for s in series {
        if let (Some(first), Some(last)) = (s.first_date(), s.last_date()) {
            latest_first = Some(latest_first.map_or(first, |d| d.max(first)));
            latest_last = Some(latest_last.map_or(last, |d| d.max(last)));
        }
    }
    let grid_start = start.or(latest_first)?;
    let grid_end = end.or(latest_last)?;
    Some((grid_start, grid_end))
}

pub fn common_grid<'a, I>(
    series: I,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<NaiveDate>
where
    I: IntoIterator<Item = &'a PriceSeries>,
{
    match common_bounds(series, start, end) {
        Some((s, e)) => business_days(s, e),
        None => Vec::new(),
    }
}
