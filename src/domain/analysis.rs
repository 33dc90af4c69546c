//! Parameters for one analysis run and the reference-index list.

use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::domain::normalizer::PORTFOLIO_SERIES_NAME;
use crate::domain::simulator::DEFAULT_CAPITAL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceIndex {
    pub name: String,
    pub ticker: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Csv,
    Yahoo,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ProviderKind::Csv),
            "yahoo" => Ok(ProviderKind::Yahoo),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub portfolio_file: PathBuf,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub capital: f64,
    pub references: Vec<ReferenceIndex>,
    pub provider: ProviderKind,
    pub csv_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl AnalysisConfig {
    pub fn new(portfolio_file: PathBuf) -> Self {
        AnalysisConfig {
            portfolio_file,
            start_date: None,
            end_date: None,
            capital: DEFAULT_CAPITAL,
            references: Vec::new(),
            provider: ProviderKind::Csv,
            csv_dir: PathBuf::from("data/prices"),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Parses `name:ticker` pairs separated by commas, e.g.
/// `CAC 40:^FCHI, S&P 500:^GSPC`. An empty input yields no references.
/// Report column names a reference overlay cannot take.
const RESERVED_NAMES: [&str; 2] = ["date", PORTFOLIO_SERIES_NAME];

pub fn parse_references(input: &str) -> Result<Vec<ReferenceIndex>, String> {
    let mut refs = Vec::new();
    let mut seen = HashSet::new();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (name, ticker) = token
            .rsplit_once(':')
            .ok_or_else(|| format!("expected name:ticker, got '{token}'"))?;
        let (name, ticker) = (name.trim(), ticker.trim());
        if name.is_empty() || ticker.is_empty() {
            return Err(format!("expected name:ticker, got '{token}'"));
        }
        if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(name)) {
            return Err(format!("reference index name '{name}' is reserved"));
        }
        if !seen.insert(name.to_string()) {
            return Err(format!("duplicate reference index: {name}"));
        }
        refs.push(ReferenceIndex {
            name: name.to_string(),
            ticker: ticker.to_string(),
        });
    }
    Ok(refs)
}
