//! Per-symbol fundamental ratios as reported by a market-data provider.

use serde::{Deserialize, Serialize};

/// Missing values mean "provider did not report", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub pe_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub market_cap: Option<f64>,
    pub company_name: Option<String>,
}

impl Fundamentals {
    pub fn with_ratios(pe_ratio: Option<f64>, debt_to_equity: Option<f64>) -> Self {
        Self {
            pe_ratio,
            debt_to_equity,
            ..Self::default()
        }
    }
}
