//! Configuration access port trait.

use crate::domain::error::KomorebiError;
use std::str::FromStr;

/// Section/key lookups. Typed getters give `Ok(None)` for an absent or blank
/// key and `ConfigInvalid` for a value that does not parse.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, KomorebiError> {
        parse_value(self.get_string(section, key), section, key, "an integer")
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, KomorebiError> {
        parse_value(self.get_string(section, key), section, key, "a number")
    }
}

fn parse_value<T: FromStr>(
    value: Option<String>,
    section: &str,
    key: &str,
    expected: &str,
) -> Result<Option<T>, KomorebiError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| {
        KomorebiError::invalid(section, key, format!("expected {expected}, got `{raw}`"))
    })
}
