//! CSV file market-data adapter.
//!
//! Layout under `base_path`:
//! - `<SYMBOL>.csv`: header row with at least `date` (YYYY-MM-DD) and `close`
//! - `fundamentals.csv`: `symbol,trailing_pe,debt_to_equity,market_cap,company_name`,
//!   empty cells meaning "not reported"

use crate::domain::error::EdgeFinderError;
use crate::domain::fundamentals::Fundamentals;
use crate::domain::price_series::{PriceBar, PriceSeries};
use crate::ports::market_data_port::{Lookback, MarketDataPort};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

const FUNDAMENTALS_FILE: &str = "fundamentals.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
    as_of: Option<NaiveDate>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            as_of: None,
        }
    }

    /// Anchors lookback windows at `as_of` instead of the latest bar on file.
    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_prices(&self, symbol: &str) -> Result<Vec<PriceBar>, EdgeFinderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            EdgeFinderError::data_source(symbol, format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| EdgeFinderError::data_source(symbol, format!("CSV header error: {}", e)))?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    EdgeFinderError::data_source(symbol, format!("missing {} column", name))
                })
        };
        let date_col = column("date")?;
        let close_col = column("close")?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result
                .map_err(|e| EdgeFinderError::data_source(symbol, format!("CSV parse error: {}", e)))?;

            let date_str = record.get(date_col).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                EdgeFinderError::data_source(symbol, format!("invalid date '{}': {}", date_str, e))
            })?;

            let close_str = record.get(close_col).unwrap_or_default().trim();
            let close: f64 = close_str.parse().map_err(|e| {
                EdgeFinderError::data_source(symbol, format!("invalid close '{}': {}", close_str, e))
            })?;

            bars.push(PriceBar { date, close });
        }

        Ok(bars)
    }

    fn read_fundamentals(&self) -> Result<HashMap<String, Fundamentals>, EdgeFinderError> {
        let path = self.base_path.join(FUNDAMENTALS_FILE);
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            EdgeFinderError::data_source("*", format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut table = HashMap::new();

        for result in rdr.records() {
            let record = result
                .map_err(|e| EdgeFinderError::data_source("*", format!("CSV parse error: {}", e)))?;

            let symbol = record.get(0).unwrap_or_default().trim().to_uppercase();
            if symbol.is_empty() {
                continue;
            }
            let fundamentals = Fundamentals {
                pe_ratio: optional_number(&symbol, record.get(1), "trailing_pe")?,
                debt_to_equity: optional_number(&symbol, record.get(2), "debt_to_equity")?,
                market_cap: optional_number(&symbol, record.get(3), "market_cap")?,
                company_name: record
                    .get(4)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            };
            table.insert(symbol, fundamentals);
        }

        Ok(table)
    }
}

fn optional_number(
    symbol: &str,
    cell: Option<&str>,
    column: &str,
) -> Result<Option<f64>, EdgeFinderError> {
    match cell.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|e| {
            EdgeFinderError::data_source(symbol, format!("invalid {} '{}': {}", column, raw, e))
        }),
    }
}

impl MarketDataPort for CsvAdapter {
    fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, EdgeFinderError> {
        let mut table = self.read_fundamentals()?;
        Ok(table.remove(&symbol.to_uppercase()).unwrap_or_default())
    }

    fn price_history(&self, symbol: &str, lookback: Lookback) -> Result<PriceSeries, EdgeFinderError> {
        let series = PriceSeries::new(self.read_prices(symbol)?);

        let anchor = match self.as_of.or_else(|| series.bars().last().map(|b| b.date)) {
            Some(date) => date,
            None => return Ok(series),
        };
        let start = anchor - Duration::days(lookback.days());

        Ok(series
            .bars()
            .iter()
            .copied()
            .filter(|b| b.date > start && b.date <= anchor)
            .collect())
    }
}
