//! Market-data provider port.

use crate::domain::error::EdgeFinderError;
use crate::domain::fundamentals::Fundamentals;
use crate::domain::price_series::PriceSeries;

/// How far back a price history request reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lookback {
    #[default]
    OneYear,
    Days(u32),
}

impl Lookback {
    pub fn days(self) -> i64 {
        match self {
            Lookback::OneYear => 365,
            Lookback::Days(n) => i64::from(n),
        }
    }
}

pub trait MarketDataPort {
    /// Fundamental ratios; fields the provider omits come back as `None`.
    fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, EdgeFinderError>;

    /// Closing prices in ascending date order. An empty series means no data;
    /// transport failures are errors.
    fn price_history(&self, symbol: &str, lookback: Lookback) -> Result<PriceSeries, EdgeFinderError>;
}
