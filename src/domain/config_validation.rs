//! Configuration validation.
//!
//! Validates all config fields before any data is fetched.

use crate::domain::analysis::{parse_references, ProviderKind};
use crate::domain::error::KomorebiError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const TTL_KEYS: [&str; 3] = ["quote_ttl_secs", "history_ttl_secs", "profile_ttl_secs"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), KomorebiError> {
    validate_portfolio_file(config)?;
    validate_dates(config)?;
    validate_capital(config)?;
    validate_references(config)?;
    validate_provider(config)?;
    validate_timeout(config)?;
    validate_cache(config)?;
    Ok(())
}

fn validate_portfolio_file(config: &dyn ConfigPort) -> Result<(), KomorebiError> {
    match config.get_string("portfolio", "file") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(KomorebiError::ConfigMissing {
            section: "portfolio".to_string(),
            key: "file".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), KomorebiError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;
    if let (Some(s), Some(e)) = (start, end) {
        if s >= e {
            return Err(KomorebiError::invalid(
                "portfolio",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

pub fn parse_optional_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, KomorebiError> {
    match config.get_string("portfolio", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                KomorebiError::invalid(
                    "portfolio",
                    key,
                    format!("invalid {key} format, expected YYYY-MM-DD"),
                )
            }),
    }
}

fn validate_capital(config: &dyn ConfigPort) -> Result<(), KomorebiError> {
    match config.get_double("portfolio", "capital")? {
        Some(value) if value <= 0.0 || !value.is_finite() => Err(KomorebiError::invalid(
            "portfolio",
            "capital",
            "capital must be positive",
        )),
        _ => Ok(()),
    }
}

fn validate_references(config: &dyn ConfigPort) -> Result<(), KomorebiError> {
    if let Some(list) = config.get_string("references", "indices") {
        parse_references(&list).map_err(|e| KomorebiError::invalid("references", "indices", e))?;
    }
    Ok(())
}

fn validate_provider(config: &dyn ConfigPort) -> Result<(), KomorebiError> {
    let Some(value) = config.get_string("data", "provider") else {
        return Ok(());
    };
    let kind: ProviderKind = value
        .parse()
        .map_err(|e: String| KomorebiError::invalid("data", "provider", e))?;
    if kind == ProviderKind::Csv {
        match config.get_string("data", "csv_dir") {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(KomorebiError::ConfigMissing {
                    section: "data".to_string(),
                    key: "csv_dir".to_string(),
                })
            }
        }
    }
    Ok(())
}

fn validate_cache(config: &dyn ConfigPort) -> Result<(), KomorebiError> {
    for key in TTL_KEYS {
        if config.get_int("cache", key)?.is_some_and(|secs| secs < 1) {
            return Err(KomorebiError::invalid(
                "cache",
                key,
                format!("{key} must be at least 1"),
            ));
        }
    }
    Ok(())
}

fn validate_timeout(config: &dyn ConfigPort) -> Result<(), KomorebiError> {
    if config.get_int("data", "timeout_secs")?.is_some_and(|secs| secs < 1) {
        return Err(KomorebiError::invalid(
            "data",
            "timeout_secs",
            "timeout_secs must be at least 1",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<(String, String), String>);

    impl MapConfig {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            MapConfig(
                entries
                    .iter()
                    .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                    .collect(),
            )
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.0.get(&(section.to_string(), key.to_string())).cloned()
        }
    }

    fn valid() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("portfolio", "file", "portfolio.csv"),
            ("portfolio", "start_date", "2023-01-01"),
            ("portfolio", "end_date", "2024-12-31"),
            ("portfolio", "capital", "1000000"),
            ("references", "indices", "CAC 40:^FCHI"),
            ("data", "provider", "csv"),
            ("data", "csv_dir", "data/prices"),
            ("cache", "quote_ttl_secs", "60"),
        ]
    }

    fn with(overrides: &[(&'static str, &'static str, &'static str)]) -> MapConfig {
        let mut entries = valid();
        for o in overrides {
            entries.retain(|e| !(e.0 == o.0 && e.1 == o.1));
            if !o.2.is_empty() {
                entries.push(*o);
            }
        }
        MapConfig::new(&entries)
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_config(&MapConfig::new(&valid())).is_ok());
    }

    #[test]
    fn minimal_config_passes() {
        let config = MapConfig::new(&[("portfolio", "file", "p.csv")]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn missing_portfolio_file() {
        let err = validate_config(&with(&[("portfolio", "file", "")])).unwrap_err();
        assert!(matches!(err, KomorebiError::ConfigMissing { key, .. } if key == "file"));
    }

    #[test]
    fn bad_date_format() {
        let err = validate_config(&with(&[("portfolio", "start_date", "01/01/2023")])).unwrap_err();
        assert!(matches!(err, KomorebiError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_after_end() {
        let err = validate_config(&with(&[("portfolio", "start_date", "2025-01-01")])).unwrap_err();
        assert!(matches!(err, KomorebiError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn non_positive_capital() {
        let err = validate_config(&with(&[("portfolio", "capital", "0")])).unwrap_err();
        assert!(matches!(err, KomorebiError::ConfigInvalid { key, .. } if key == "capital"));
    }

    #[test]
    fn malformed_references() {
        let err = validate_config(&with(&[("references", "indices", "CAC 40")])).unwrap_err();
        assert!(matches!(
            err,
            KomorebiError::ConfigInvalid { section, .. } if section == "references"
        ));
    }

    #[test]
    fn unknown_provider() {
        let err = validate_config(&with(&[("data", "provider", "bloomberg")])).unwrap_err();
        assert!(matches!(err, KomorebiError::ConfigInvalid { key, .. } if key == "provider"));
    }

    #[test]
    fn csv_provider_needs_dir() {
        let err = validate_config(&with(&[("data", "csv_dir", "")])).unwrap_err();
        assert!(matches!(err, KomorebiError::ConfigMissing { key, .. } if key == "csv_dir"));
    }

    #[test]
    fn zero_ttl_rejected() {
        let err = validate_config(&with(&[("cache", "quote_ttl_secs", "0")])).unwrap_err();
        assert!(matches!(err, KomorebiError::ConfigInvalid { key, .. } if key == "quote_ttl_secs"));
    }

    #[test]
    fn unparsable_capital_rejected() {
        let err = validate_config(&with(&[("portfolio", "capital", "500,000")])).unwrap_err();
        assert!(matches!(err, KomorebiError::ConfigInvalid { key, .. } if key == "capital"));
    }

    #[test]
    fn unparsable_ttl_rejected() {
        let err = validate_config(&with(&[("cache", "quote_ttl_secs", "30s")])).unwrap_err();
        assert!(matches!(err, KomorebiError::ConfigInvalid { key, .. } if key == "quote_ttl_secs"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = validate_config(&with(&[("data", "timeout_secs", "0")])).unwrap_err();
        assert!(matches!(err, KomorebiError::ConfigInvalid { key, .. } if key == "timeout_secs"));
    }
}
