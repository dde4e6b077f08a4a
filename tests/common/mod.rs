#![allow(dead_code)]

use chrono::NaiveDate;
use edgefinder::domain::error::EdgeFinderError;
use edgefinder::domain::fundamentals::Fundamentals;
pub use edgefinder::domain::price_series::{PriceBar, PriceSeries};
use edgefinder::ports::market_data_port::{Lookback, MarketDataPort};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct MockMarketDataPort {
    pub prices: HashMap<String, Vec<PriceBar>>,
    pub fundamentals: HashMap<String, Fundamentals>,
    pub errors: HashMap<String, String>,
    pub panics: Vec<String>,
    pub calls: AtomicUsize,
}

impl MockMarketDataPort {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
            fundamentals: HashMap::new(),
            errors: HashMap::new(),
            panics: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_prices(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.prices.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_fundamentals(mut self, symbol: &str, fundamentals: Fundamentals) -> Self {
        self.fundamentals.insert(symbol.to_string(), fundamentals);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    /// Makes every lookup for `symbol` panic instead of returning.
    pub fn with_panic(mut self, symbol: &str) -> Self {
        self.panics.push(symbol.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, symbol: &str) -> Result<(), EdgeFinderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panics.iter().any(|s| s == symbol) {
            panic!("adapter crashed on {symbol}");
        }
        match self.errors.get(symbol) {
            Some(reason) => Err(EdgeFinderError::data_source(symbol, reason.clone())),
            None => Ok(()),
        }
    }
}

impl MarketDataPort for MockMarketDataPort {
    fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, EdgeFinderError> {
        self.check(symbol)?;
        Ok(self.fundamentals.get(symbol).cloned().unwrap_or_default())
    }

    fn price_history(&self, symbol: &str, _lookback: Lookback) -> Result<PriceSeries, EdgeFinderError> {
        self.check(symbol)?;
        Ok(PriceSeries::new(
            self.prices.get(symbol).cloned().unwrap_or_default(),
        ))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive daily bars from `start_date`, one per close.
pub fn bars_from_closes(start_date: &str, closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            date: start + chrono::Duration::days(i as i64),
            close,
        })
        .collect()
}

/// `count` bars moving by `step` per day from `start_price`.
pub fn trending_bars(start_date: &str, count: usize, start_price: f64, step: f64) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + step * i as f64).collect();
    bars_from_closes(start_date, &closes)
}

pub fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Writes `<SYMBOL>.csv` price files and an optional fundamentals table.
pub fn write_csv_dir(
    dir: &std::path::Path,
    prices: &[(&str, Vec<PriceBar>)],
    fundamentals: Option<&str>,
) {
    for (symbol, bars) in prices {
        let mut content = String::from("date,close\n");
        for bar in bars {
            content.push_str(&format!("{},{}\n", bar.date.format("%Y-%m-%d"), bar.close));
        }
        std::fs::write(dir.join(format!("{}.csv", symbol)), content).unwrap();
    }
    if let Some(table) = fundamentals {
        std::fs::write(dir.join("fundamentals.csv"), table).unwrap();
    }
}
