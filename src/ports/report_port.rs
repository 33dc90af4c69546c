//! Report generation port trait.

use crate::domain::allocation::LabelKind;
use crate::domain::error::KomorebiError;
use crate::domain::normalizer::PortfolioPerformance;
use crate::domain::simulator::SimulationResult;
use std::collections::BTreeMap;
use std::path::Path;

/// Port for writing analysis results.
pub trait ReportPort {
    fn write_performance(
        &self,
        performance: &PortfolioPerformance,
        output_path: &Path,
    ) -> Result<(), KomorebiError>;

    fn write_simulation(
        &self,
        result: &SimulationResult,
        output_path: &Path,
    ) -> Result<(), KomorebiError>;

    fn write_allocation(
        &self,
        kind: LabelKind,
        allocation: &BTreeMap<String, f64>,
        output_path: &Path,
    ) -> Result<(), KomorebiError>;
}
