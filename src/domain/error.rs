//! Domain error types.

use crate::domain::sizing::SizingError;
use crate::domain::universe::UniverseError;

/// Top-level error type for edgefinder.
#[derive(Debug, thiserror::Error)]
pub enum EdgeFinderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("market data error for {symbol}: {reason}")]
    DataSource { symbol: String, reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("invalid screening criteria: {reason}")]
    InvalidCriteria { reason: String },

    #[error(transparent)]
    Sizing(#[from] SizingError),

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EdgeFinderError {
    pub fn data_source(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataSource {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_criteria(reason: impl Into<String>) -> Self {
        Self::InvalidCriteria {
            reason: reason.into(),
        }
    }
}

impl From<&EdgeFinderError> for std::process::ExitCode {
    fn from(err: &EdgeFinderError) -> Self {
        let code: u8 = match err {
            EdgeFinderError::Io(_) => 1,
            EdgeFinderError::ConfigParse { .. }
            | EdgeFinderError::ConfigMissing { .. }
            | EdgeFinderError::ConfigInvalid { .. } => 2,
            EdgeFinderError::DataSource { .. } => 3,
            EdgeFinderError::InvalidCriteria { .. }
            | EdgeFinderError::Sizing(_)
            | EdgeFinderError::Universe(_) => 4,
            EdgeFinderError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
