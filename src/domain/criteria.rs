//! Screening criteria and their batch-level validation.
//!
//! Every field is optional; an unset field imposes no constraint and all set
//! fields must hold together.

use crate::domain::error::EdgeFinderError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreeningCriteria {
    pub pe_max: Option<f64>,
    pub pe_min: Option<f64>,
    pub debt_to_equity_max: Option<f64>,
    pub debt_to_equity_min: Option<f64>,
    pub rsi_upper: Option<f64>,
    pub rsi_lower: Option<f64>,
    pub sma_above: Option<bool>,
    pub sma_below: Option<bool>,
}

impl ScreeningCriteria {
    pub fn uses_rsi(&self) -> bool {
        self.rsi_upper.is_some() || self.rsi_lower.is_some()
    }

    pub fn uses_sma(&self) -> bool {
        self.sma_above.is_some() || self.sma_below.is_some()
    }

    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    /// Rejects criteria that are malformed as a whole, before any symbol is evaluated.
    pub fn validate(&self) -> Result<(), EdgeFinderError> {
        let numeric = [
            ("pe_max", self.pe_max),
            ("pe_min", self.pe_min),
            ("debt_to_equity_max", self.debt_to_equity_max),
            ("debt_to_equity_min", self.debt_to_equity_min),
            ("rsi_upper", self.rsi_upper),
            ("rsi_lower", self.rsi_lower),
        ];
        for (name, value) in numeric {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(EdgeFinderError::invalid_criteria(format!(
                        "{name} must be a finite number"
                    )));
                }
            }
        }

        check_range("pe_min", self.pe_min, "pe_max", self.pe_max)?;
        check_range(
            "debt_to_equity_min",
            self.debt_to_equity_min,
            "debt_to_equity_max",
            self.debt_to_equity_max,
        )?;
        check_range("rsi_lower", self.rsi_lower, "rsi_upper", self.rsi_upper)?;

        for (name, value) in [("rsi_upper", self.rsi_upper), ("rsi_lower", self.rsi_lower)] {
            if let Some(v) = value {
                if !(0.0..=100.0).contains(&v) {
                    return Err(EdgeFinderError::invalid_criteria(format!(
                        "{name} must be within [0, 100], got {v}"
                    )));
                }
            }
        }

        if self.sma_above == Some(true) && self.sma_below == Some(true) {
            return Err(EdgeFinderError::invalid_criteria(
                "sma_above and sma_below cannot both be set",
            ));
        }

        Ok(())
    }
}

fn check_range(
    min_name: &str,
    min: Option<f64>,
    max_name: &str,
    max: Option<f64>,
) -> Result<(), EdgeFinderError> {
    match (min, max) {
        (Some(lo), Some(hi)) if lo > hi => Err(EdgeFinderError::invalid_criteria(format!(
            "{min_name} ({lo}) exceeds {max_name} ({hi})"
        ))),
        _ => Ok(()),
    }
}
