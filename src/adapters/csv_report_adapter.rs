//! Chart-ready CSV reports.
//!
//! Line-chart files have a `date` column followed by one column per series,
//! the portfolio curve first. Allocation files are `label,weight,percent`
//! rows in ascending weight order.

use crate::domain::allocation::{LabelKind, sorted_allocation};
use crate::domain::error::KomorebiError;
use crate::domain::normalizer::PortfolioPerformance;
use crate::domain::price_series::NamedSeries;
use crate::domain::simulator::SimulationResult;
use crate::ports::report_port::ReportPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }

    fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>, KomorebiError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        csv::Writer::from_path(path).map_err(|e| csv_error(path, e))
    }

    fn write_lines(
        grid: &[NaiveDate],
        series: &[&NamedSeries],
        path: &Path,
    ) -> Result<(), KomorebiError> {
        let mut wtr = Self::writer(path)?;
        let header = std::iter::once("date").chain(series.iter().map(|s| s.name.as_str()));
        wtr.write_record(header).map_err(|e| csv_error(path, e))?;

        for &date in grid {
            let mut row = vec![date.format("%Y-%m-%d").to_string()];
            row.extend(
                series
                    .iter()
                    .map(|s| s.value_on(date).map(format_value).unwrap_or_default()),
            );
            wtr.write_record(&row).map_err(|e| csv_error(path, e))?;
        }
        wtr.flush()?;
        info!(path = %path.display(), rows = grid.len(), columns = series.len(), "wrote report");
        Ok(())
    }
}

fn csv_error(path: &Path, e: csv::Error) -> KomorebiError {
    KomorebiError::DataFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn format_value(v: f64) -> String {
    format!("{v:.4}")
}

impl ReportPort for CsvReportAdapter {
    fn write_performance(
        &self,
        performance: &PortfolioPerformance,
        output_path: &Path,
    ) -> Result<(), KomorebiError> {
        let mut series = vec![&performance.index];
        series.extend(performance.references.values());
        Self::write_lines(&performance.grid, &series, output_path)
    }

    fn write_simulation(
        &self,
        result: &SimulationResult,
        output_path: &Path,
    ) -> Result<(), KomorebiError> {
        let mut series = vec![&result.portfolio_value];
        series.extend(result.holdings.values());
        Self::write_lines(&result.grid, &series, output_path)
    }

    fn write_allocation(
        &self,
        kind: LabelKind,
        allocation: &BTreeMap<String, f64>,
        output_path: &Path,
    ) -> Result<(), KomorebiError> {
        let total: f64 = allocation.values().sum();
        let mut wtr = Self::writer(output_path)?;
        wtr.write_record(["label", "weight", "percent"])
            .map_err(|e| csv_error(output_path, e))?;
        for (label, weight) in sorted_allocation(allocation) {
            let percent = if total > 0.0 { weight / total * 100.0 } else { 0.0 };
            wtr.write_record([label, format!("{weight:.6}"), format!("{percent:.2}")])
                .map_err(|e| csv_error(output_path, e))?;
        }
        wtr.flush()?;
        info!(path = %output_path.display(), %kind, labels = allocation.len(), "wrote allocation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalizer::normalize_and_aggregate;
    use crate::domain::price_series::PriceSeries;
    use crate::domain::simulator::simulate;
    use tempfile::TempDir;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn histories() -> BTreeMap<String, PriceSeries> {
        let mut h = BTreeMap::new();
        h.insert("A".to_string(), PriceSeries::from_pairs([(d(1), 10.0), (d(2), 20.0)]));
        h.insert("B".to_string(), PriceSeries::from_pairs([(d(1), 5.0), (d(2), 5.0)]));
        h
    }

    #[test]
    fn performance_csv_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/performance.csv");
        let mut refs = BTreeMap::new();
        refs.insert(
            "CAC 40".to_string(),
            PriceSeries::from_pairs([(d(1), 7000.0), (d(2), 7070.0)]),
        );
        let perf = normalize_and_aggregate(&histories(), None, &refs, None, None).unwrap();

        CsvReportAdapter::new().write_performance(&perf, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "date,Portfolio,CAC 40");
        assert_eq!(lines[1], "2024-01-01,100.0000,100.0000");
        assert_eq!(lines[2], "2024-01-02,150.0000,101.0000");
    }

    #[test]
    fn simulation_csv_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("simulation.csv");
        let result = simulate(&histories(), 1000.0, None, None);

        CsvReportAdapter::new().write_simulation(&result, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "date,Portfolio Total,A,B");
        assert_eq!(lines[1], "2024-01-01,1000.0000,500.0000,500.0000");
        assert_eq!(lines[2], "2024-01-02,1500.0000,1000.0000,500.0000");
    }

    #[test]
    fn allocation_csv_sorted_ascending() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sector.csv");
        let mut alloc = BTreeMap::new();
        alloc.insert("Industrials".to_string(), 0.75);
        alloc.insert("Healthcare".to_string(), 0.25);

        CsvReportAdapter::new()
            .write_allocation(LabelKind::Sector, &alloc, &path)
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "label,weight,percent");
        assert_eq!(lines[1], "Healthcare,0.250000,25.00");
        assert_eq!(lines[2], "Industrials,0.750000,75.00");
    }
}
