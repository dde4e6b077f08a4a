//! Configuration validation and extraction for the screener.
//!
//! Validates every config field before a screen runs, then builds
//! [`ScreeningCriteria`] and [`ScreenerSettings`] from the checked values.

use crate::domain::criteria::ScreeningCriteria;
use crate::domain::error::EdgeFinderError;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_WORKERS: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerSettings {
    pub data_dir: PathBuf,
    /// Date price windows end on; the latest bar on file when unset.
    pub as_of: Option<NaiveDate>,
    pub max_workers: usize,
}

impl ScreenerSettings {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            as_of: None,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

pub fn validate_screener_config(config: &dyn ConfigPort) -> Result<(), EdgeFinderError> {
    validate_data_dir(config)?;
    read_as_of(config)?;
    read_max_workers(config)?;
    validate_symbol_lists(config)?;
    validate_criteria(config)?;
    Ok(())
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), EdgeFinderError> {
    match config.get_string("data", "dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(EdgeFinderError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        }),
    }
}

fn read_as_of(config: &dyn ConfigPort) -> Result<Option<NaiveDate>, EdgeFinderError> {
    match config
        .get_string("data", "as_of")
        .filter(|s| !s.trim().is_empty())
    {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| EdgeFinderError::ConfigInvalid {
                section: "data".to_string(),
                key: "as_of".to_string(),
                reason: "invalid as_of format, expected YYYY-MM-DD".to_string(),
            }),
    }
}

fn read_max_workers(config: &dyn ConfigPort) -> Result<usize, EdgeFinderError> {
    let invalid = |reason: String| EdgeFinderError::ConfigInvalid {
        section: "screener".to_string(),
        key: "max_workers".to_string(),
        reason,
    };
    match config.get_int("screener", "max_workers").map_err(invalid)? {
        None => Ok(DEFAULT_MAX_WORKERS),
        Some(value) if value >= 1 => {
            usize::try_from(value).map_err(|e| invalid(e.to_string()))
        }
        Some(_) => Err(invalid("max_workers must be at least 1".to_string())),
    }
}

fn validate_symbol_lists(config: &dyn ConfigPort) -> Result<(), EdgeFinderError> {
    for key in ["symbols", "universe"] {
        if let Some(list) = config
            .get_string("screener", key)
            .filter(|s| !s.trim().is_empty())
        {
            parse_symbols(&list).map_err(|e| EdgeFinderError::ConfigInvalid {
                section: "screener".to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        }
    }
    Ok(())
}

fn validate_criteria(config: &dyn ConfigPort) -> Result<(), EdgeFinderError> {
    criteria_from_config(config)?.validate()
}

fn read_number(config: &dyn ConfigPort, key: &str) -> Result<Option<f64>, EdgeFinderError> {
    config
        .get_double("criteria", key)
        .map_err(|e| EdgeFinderError::ConfigInvalid {
            section: "criteria".to_string(),
            key: key.to_string(),
            reason: format!("expected a number: {e}"),
        })
}

fn read_flag(config: &dyn ConfigPort, key: &str) -> Result<Option<bool>, EdgeFinderError> {
    config
        .get_bool("criteria", key)
        .map_err(|e| EdgeFinderError::ConfigInvalid {
            section: "criteria".to_string(),
            key: key.to_string(),
            reason: format!("expected true/false: {e}"),
        })
}

/// Builds criteria from `[criteria]`; absent keys stay unset.
pub fn criteria_from_config(config: &dyn ConfigPort) -> Result<ScreeningCriteria, EdgeFinderError> {
    Ok(ScreeningCriteria {
        pe_max: read_number(config, "pe_max")?,
        pe_min: read_number(config, "pe_min")?,
        debt_to_equity_max: read_number(config, "debt_to_equity_max")?,
        debt_to_equity_min: read_number(config, "debt_to_equity_min")?,
        rsi_upper: read_number(config, "rsi_upper")?,
        rsi_lower: read_number(config, "rsi_lower")?,
        sma_above: read_flag(config, "sma_above")?,
        sma_below: read_flag(config, "sma_below")?,
    })
}

pub fn screener_settings(config: &dyn ConfigPort) -> Result<ScreenerSettings, EdgeFinderError> {
    let data_dir = config
        .get_string("data", "dir")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| EdgeFinderError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        })?;
    screener_settings_with_dir(config, Path::new(data_dir.trim()))
}

/// Settings read from `config`, with `data_dir` in place of `[data] dir`.
pub fn screener_settings_with_dir(
    config: &dyn ConfigPort,
    data_dir: &Path,
) -> Result<ScreenerSettings, EdgeFinderError> {
    Ok(ScreenerSettings {
        data_dir: data_dir.to_path_buf(),
        as_of: read_as_of(config)?,
        max_workers: read_max_workers(config)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockConfig {
        values: HashMap<(String, String), String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                values: HashMap::new(),
            }
        }

        fn set(mut self, section: &str, key: &str, value: &str) -> Self {
            self.values
                .insert((section.to_string(), key.to_string()), value.to_string());
            self
        }

        fn valid() -> Self {
            Self::new().set("data", "dir", "/tmp/prices")
        }
    }

    impl ConfigPort for MockConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String> {
            self.typed(section, key, |v| v.parse().map_err(|_| "not an integer".to_string()))
        }

        fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, String> {
            self.typed(section, key, |v| v.parse().map_err(|_| "not a number".to_string()))
        }

        fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String> {
            self.typed(section, key, |v| match v.to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(true),
                "false" | "no" | "off" | "0" => Ok(false),
                _ => Err("not a boolean".to_string()),
            })
        }
    }

    impl MockConfig {
        fn typed<T>(
            &self,
            section: &str,
            key: &str,
            parse: impl FnOnce(&str) -> Result<T, String>,
        ) -> Result<Option<T>, String> {
            match self.get_string(section, key) {
                Some(v) if !v.trim().is_empty() => parse(v.trim()).map(Some),
                _ => Ok(None),
            }
        }
    }

    #[test]
    fn minimal_config_is_valid() {
        assert!(validate_screener_config(&MockConfig::valid()).is_ok());
    }

    #[test]
    fn missing_data_dir() {
        let err = validate_screener_config(&MockConfig::new()).unwrap_err();
        assert!(matches!(err, EdgeFinderError::ConfigMissing { ref key, .. } if key == "dir"));
    }

    #[test]
    fn zero_workers_rejected() {
        let config = MockConfig::valid().set("screener", "max_workers", "0");
        let err = validate_screener_config(&config).unwrap_err();
        assert!(matches!(err, EdgeFinderError::ConfigInvalid { ref key, .. } if key == "max_workers"));
    }

    #[test]
    fn malformed_as_of_rejected() {
        let config = MockConfig::valid().set("data", "as_of", "30/06/2024");
        let err = validate_screener_config(&config).unwrap_err();
        assert!(matches!(err, EdgeFinderError::ConfigInvalid { ref key, .. } if key == "as_of"));
    }

    #[test]
    fn duplicate_symbols_rejected() {
        let config = MockConfig::valid().set("screener", "symbols", "AAPL,aapl");
        let err = validate_screener_config(&config).unwrap_err();
        assert!(matches!(err, EdgeFinderError::ConfigInvalid { ref key, .. } if key == "symbols"));
    }

    #[test]
    fn non_numeric_criterion_rejected() {
        let config = MockConfig::valid().set("criteria", "pe_max", "cheap");
        let err = validate_screener_config(&config).unwrap_err();
        assert!(matches!(err, EdgeFinderError::ConfigInvalid { ref key, .. } if key == "pe_max"));
    }

    #[test]
    fn non_numeric_workers_rejected() {
        let config = MockConfig::valid().set("screener", "max_workers", "many");
        let err = screener_settings(&config).unwrap_err();
        assert!(matches!(err, EdgeFinderError::ConfigInvalid { ref key, .. } if key == "max_workers"));
    }

    #[test]
    fn bad_flag_rejected() {
        let config = MockConfig::valid().set("criteria", "sma_above", "maybe");
        assert!(validate_screener_config(&config).is_err());
    }

    #[test]
    fn inverted_range_surfaces_as_criteria_error() {
        let config = MockConfig::valid()
            .set("criteria", "rsi_lower", "70")
            .set("criteria", "rsi_upper", "30");
        let err = validate_screener_config(&config).unwrap_err();
        assert!(matches!(err, EdgeFinderError::InvalidCriteria { .. }));
    }

    #[test]
    fn criteria_built_from_config() {
        let config = MockConfig::valid()
            .set("criteria", "pe_max", "30")
            .set("criteria", "debt_to_equity_min", " 0.5 ")
            .set("criteria", "sma_above", "yes");
        let criteria = criteria_from_config(&config).unwrap();
        assert_eq!(criteria.pe_max, Some(30.0));
        assert_eq!(criteria.debt_to_equity_min, Some(0.5));
        assert_eq!(criteria.sma_above, Some(true));
        assert_eq!(criteria.sma_below, None);
        assert_eq!(criteria.rsi_upper, None);
    }

    #[test]
    fn settings_read_as_of_and_workers() {
        let config = MockConfig::valid()
            .set("data", "as_of", "2024-06-28")
            .set("screener", "max_workers", "4");
        let settings = screener_settings(&config).unwrap();
        assert_eq!(settings.as_of, NaiveDate::from_ymd_opt(2024, 6, 28));
        assert_eq!(settings.max_workers, 4);
    }

    #[test]
    fn explicit_dir_replaces_config_dir() {
        let config = MockConfig::new().set("screener", "max_workers", "2");
        let settings = screener_settings_with_dir(&config, Path::new("/srv/prices")).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/srv/prices"));
        assert_eq!(settings.max_workers, 2);
    }

    #[test]
    fn settings_use_defaults() {
        let settings = screener_settings(&MockConfig::valid()).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/prices"));
        assert_eq!(settings.as_of, None);
        assert_eq!(settings.max_workers, DEFAULT_MAX_WORKERS);
    }
}
