//! Price histories and the dated value series derived from them.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Closing prices for one ticker, strictly increasing by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series from unordered points. Later duplicates of a date win.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        // stable sort keeps input order among equal dates, so the last one is the newest
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self { points: deduped }
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(date, close)| PricePoint { date, close })
                .collect(),
        )
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no point carries a finite price.
    pub fn is_empty(&self) -> bool {
        !self.points.iter().any(|p| p.close.is_finite())
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points
            .iter()
            .find(|p| p.close.is_finite())
            .map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points
            .iter()
            .rev()
            .find(|p| p.close.is_finite())
            .map(|p| p.date)
    }

    pub fn first_close(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.close)
            .find(|c| c.is_finite())
    }

    pub fn last_close(&self) -> Option<f64> {
        self.points
            .iter()
            .rev()
            .map(|p| p.close)
            .find(|c| c.is_finite())
    }

    /// Most recent finite close on or before `date`.
    pub fn close_on_or_before(&self, date: NaiveDate) -> Option<f64> {
        let end = self.points.partition_point(|p| p.date <= date);
        self.points[..end]
            .iter()
            .rev()
            .map(|p| p.close)
            .find(|c| c.is_finite())
    }

    /// Finite close whose date is closest to `date`; ties go to the earlier point.
    pub fn close_nearest(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .iter()
            .filter(|p| p.close.is_finite())
            .min_by_key(|p| (p.date - date).num_days().abs())
            .map(|p| p.close)
    }

    /// Forward-filled closes on `grid`, `None` where no earlier price exists.
    ///
    /// `grid` must be sorted ascending.
    pub fn reindex_ffill(&self, grid: &[NaiveDate]) -> Vec<Option<f64>> {
        let mut out = Vec::with_capacity(grid.len());
        let mut idx = 0;
        let mut last: Option<f64> = None;
        for &date in grid {
            while idx < self.points.len() && self.points[idx].date <= date {
                let close = self.points[idx].close;
                if close.is_finite() {
                    last = Some(close);
                }
                idx += 1;
            }
            out.push(last);
        }
        out
    }

    /// Points with `start <= date <= end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        PriceSeries {
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .copied()
                .collect(),
        }
    }
}

/// One value on a dated curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A named curve ready for a line chart.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

impl NamedSeries {
    pub fn new(name: impl Into<String>, points: Vec<SeriesPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn from_grid(name: impl Into<String>, grid: &[NaiveDate], values: &[f64]) -> Self {
        let points = grid
            .iter()
            .zip(values)
            .map(|(&date, &value)| SeriesPoint { date, value })
            .collect();
        Self::new(name, points)
    }

    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }

    pub fn first(&self) -> Option<&SeriesPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Base-100 index of one instrument on the common grid.
pub type NormalizedSeries = NamedSeries;
