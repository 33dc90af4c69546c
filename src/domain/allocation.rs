//! Sector and country allocation breakdowns.

use crate::domain::portfolio::Portfolio;
use std::collections::BTreeMap;

pub const UNKNOWN_LABEL: &str = "Not available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Sector,
    Country,
}

impl LabelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelKind::Sector => "sector",
            LabelKind::Country => "country",
        }
    }
}

impl std::fmt::Display for LabelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledWeight {
    pub ticker: String,
    pub label: String,
    pub weight: f64,
}

/// Sums weight per label. Total output weight equals total input weight.
pub fn aggregate_by_label(holdings: &[LabeledWeight]) -> BTreeMap<String, f64> {
    let mut out: BTreeMap<String, f64> = BTreeMap::new();
    for h in holdings {
        *out.entry(h.label.clone()).or_insert(0.0) += h.weight;
    }
    out
}

/// Labels ascending by weight, then by name, as horizontal bar charts expect.
pub fn sorted_allocation(allocation: &BTreeMap<String, f64>) -> Vec<(String, f64)> {
    let mut rows: Vec<(String, f64)> = allocation
        .iter()
        .map(|(label, w)| (label.clone(), *w))
        .collect();
    rows.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

/// Pairs each holding with a label using `resolve`, falling back to
/// [`UNKNOWN_LABEL`], and the portfolio's participation weight.
pub fn label_holdings<F>(portfolio: &Portfolio, mut resolve: F) -> Vec<LabeledWeight>
where
    F: FnMut(&str) -> Option<String>,
{
    let weights = portfolio.weights();
    portfolio
        .holdings
        .iter()
        .map(|h| {
            let label = resolve(&h.ticker)
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
            LabeledWeight {
                ticker: h.ticker.clone(),
                label,
                weight: weights.get(&h.ticker).copied().unwrap_or(0.0),
            }
        })
        .collect()
}
