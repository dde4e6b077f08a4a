//! Criteria screening over a symbol universe.
//!
//! Each symbol is evaluated independently: fetch fundamentals and a one-year
//! price history, apply the fundamental bounds, then RSI and SMA-200 checks.
//! A symbol whose data cannot be fetched is excluded from the matches and the
//! batch carries on; only malformed criteria fail the whole batch.

use crate::domain::criteria::ScreeningCriteria;
use crate::domain::error::EdgeFinderError;
use crate::domain::fundamentals::Fundamentals;
use crate::domain::indicator::{calculate_rsi, calculate_sma, DEFAULT_RSI_PERIOD, SMA_TREND_WINDOW};
use crate::domain::price_series::PriceSeries;
use crate::ports::market_data_port::{Lookback, MarketDataPort};
use rayon::prelude::*;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    EmptyHistory,
    PeAboveMax { pe_ratio: f64, max: f64 },
    PeBelowMin { pe_ratio: f64, min: f64 },
    DebtToEquityAboveMax { debt_to_equity: f64, max: f64 },
    DebtToEquityBelowMin { debt_to_equity: f64, min: f64 },
    RsiAboveUpper { rsi: f64, upper: f64 },
    RsiBelowLower { rsi: f64, lower: f64 },
    CloseNotAboveSma { close: f64, sma: f64 },
    CloseNotBelowSma { close: f64, sma: f64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::EmptyHistory => write!(f, "no price history"),
            RejectReason::PeAboveMax { pe_ratio, max } => {
                write!(f, "P/E {:.2} above max {:.2}", pe_ratio, max)
            }
            RejectReason::PeBelowMin { pe_ratio, min } => {
                write!(f, "P/E {:.2} below min {:.2}", pe_ratio, min)
            }
            RejectReason::DebtToEquityAboveMax { debt_to_equity, max } => {
                write!(f, "D/E {:.2} above max {:.2}", debt_to_equity, max)
            }
            RejectReason::DebtToEquityBelowMin { debt_to_equity, min } => {
                write!(f, "D/E {:.2} below min {:.2}", debt_to_equity, min)
            }
            RejectReason::RsiAboveUpper { rsi, upper } => {
                write!(f, "RSI {:.2} above {:.2}", rsi, upper)
            }
            RejectReason::RsiBelowLower { rsi, lower } => {
                write!(f, "RSI {:.2} below {:.2}", rsi, lower)
            }
            RejectReason::CloseNotAboveSma { close, sma } => {
                write!(f, "close {:.2} not above SMA(200) {:.2}", close, sma)
            }
            RejectReason::CloseNotBelowSma { close, sma } => {
                write!(f, "close {:.2} not below SMA(200) {:.2}", close, sma)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Matched,
    Rejected { detail: RejectReason },
    /// Data could not be fetched or evaluated.
    Excluded { error: String },
}

impl Outcome {
    pub fn is_match(&self) -> bool {
        matches!(self, Outcome::Matched)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolEvaluation {
    pub symbol: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningResult {
    pub symbols: Vec<String>,
    pub total_matches: usize,
    pub evaluations: Vec<SymbolEvaluation>,
}

impl ScreeningResult {
    fn from_evaluations(evaluations: Vec<SymbolEvaluation>) -> Self {
        let symbols: Vec<String> = evaluations
            .iter()
            .filter(|e| e.outcome.is_match())
            .map(|e| e.symbol.clone())
            .collect();
        Self {
            total_matches: symbols.len(),
            symbols,
            evaluations,
        }
    }

    pub fn excluded(&self) -> impl Iterator<Item = &SymbolEvaluation> {
        self.evaluations
            .iter()
            .filter(|e| matches!(e.outcome, Outcome::Excluded { .. }))
    }
}

/// Applies `criteria` to one symbol's data. Pure: no I/O.
pub fn evaluate(
    fundamentals: &Fundamentals,
    prices: &PriceSeries,
    criteria: &ScreeningCriteria,
) -> Outcome {
    match check_all(fundamentals, prices, criteria) {
        Ok(()) => Outcome::Matched,
        Err(detail) => Outcome::Rejected { detail },
    }
}

fn check_all(
    fundamentals: &Fundamentals,
    prices: &PriceSeries,
    criteria: &ScreeningCriteria,
) -> Result<(), RejectReason> {
    if let Some(pe_ratio) = fundamentals.pe_ratio {
        if let Some(max) = criteria.pe_max.filter(|&max| pe_ratio > max) {
            return Err(RejectReason::PeAboveMax { pe_ratio, max });
        }
        if let Some(min) = criteria.pe_min.filter(|&min| pe_ratio < min) {
            return Err(RejectReason::PeBelowMin { pe_ratio, min });
        }
    }

    if let Some(debt_to_equity) = fundamentals.debt_to_equity {
        if let Some(max) = criteria.debt_to_equity_max.filter(|&max| debt_to_equity > max) {
            return Err(RejectReason::DebtToEquityAboveMax { debt_to_equity, max });
        }
        if let Some(min) = criteria.debt_to_equity_min.filter(|&min| debt_to_equity < min) {
            return Err(RejectReason::DebtToEquityBelowMin { debt_to_equity, min });
        }
    }

    let Some(close) = prices.latest_close() else {
        return Err(RejectReason::EmptyHistory);
    };

    if criteria.uses_rsi() {
        // Too little history leaves RSI undefined; that alone never rejects.
        if let Some(rsi) = calculate_rsi(prices.bars(), DEFAULT_RSI_PERIOD).latest() {
            if let Some(upper) = criteria.rsi_upper.filter(|&upper| rsi > upper) {
                return Err(RejectReason::RsiAboveUpper { rsi, upper });
            }
            if let Some(lower) = criteria.rsi_lower.filter(|&lower| rsi < lower) {
                return Err(RejectReason::RsiBelowLower { rsi, lower });
            }
        }
    }

    if criteria.uses_sma() && prices.len() >= SMA_TREND_WINDOW {
        if let Some(sma) = calculate_sma(prices.bars(), SMA_TREND_WINDOW).latest() {
            if criteria.sma_above == Some(true) && close <= sma {
                return Err(RejectReason::CloseNotAboveSma { close, sma });
            }
            if criteria.sma_below == Some(true) && close >= sma {
                return Err(RejectReason::CloseNotBelowSma { close, sma });
            }
        }
    }

    Ok(())
}

fn fetch_and_evaluate(
    port: &dyn MarketDataPort,
    symbol: &str,
    criteria: &ScreeningCriteria,
) -> Result<Outcome, EdgeFinderError> {
    let fundamentals = port.fundamentals(symbol)?;
    let prices = port.price_history(symbol, Lookback::OneYear)?;
    Ok(evaluate(&fundamentals, &prices, criteria))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

fn evaluate_symbol(
    port: &dyn MarketDataPort,
    symbol: &str,
    criteria: &ScreeningCriteria,
) -> SymbolEvaluation {
    let fetched =
        panic::catch_unwind(AssertUnwindSafe(|| fetch_and_evaluate(port, symbol, criteria)));
    let outcome = match fetched {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            warn!(symbol, error = %e, "excluding symbol from screen");
            Outcome::Excluded {
                error: e.to_string(),
            }
        }
        Err(payload) => {
            let error = format!("market data lookup panicked: {}", panic_message(&*payload));
            warn!(symbol, %error, "excluding symbol from screen");
            Outcome::Excluded { error }
        }
    };
    if let Outcome::Rejected { detail } = &outcome {
        debug!(symbol, %detail, "symbol rejected");
    }
    SymbolEvaluation {
        symbol: symbol.to_string(),
        outcome,
    }
}

/// Screens `symbols` in order, one at a time.
pub fn screen(
    port: &dyn MarketDataPort,
    symbols: &[String],
    criteria: &ScreeningCriteria,
) -> Result<ScreeningResult, EdgeFinderError> {
    criteria.validate()?;
    if criteria.is_unconstrained() {
        debug!("no criteria set, any symbol with price history matches");
    }

    let evaluations = symbols
        .iter()
        .map(|symbol| evaluate_symbol(port, symbol, criteria))
        .collect();

    let result = ScreeningResult::from_evaluations(evaluations);
    info!(
        screened = symbols.len(),
        matches = result.total_matches,
        "screen complete"
    );
    Ok(result)
}

/// Screens `symbols` on up to `max_workers` threads. Results keep input order.
pub fn screen_parallel(
    port: &(dyn MarketDataPort + Sync),
    symbols: &[String],
    criteria: &ScreeningCriteria,
    max_workers: usize,
) -> Result<ScreeningResult, EdgeFinderError> {
    criteria.validate()?;
    if criteria.is_unconstrained() {
        debug!("no criteria set, any symbol with price history matches");
    }
    if max_workers == 0 {
        return Err(EdgeFinderError::ConfigInvalid {
            section: "screener".into(),
            key: "max_workers".into(),
            reason: "must be at least 1".into(),
        });
    }

    let workers = max_workers.min(symbols.len()).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| EdgeFinderError::ConfigInvalid {
            section: "screener".into(),
            key: "max_workers".into(),
            reason: format!("cannot start worker pool: {e}"),
        })?;

    let evaluations: Vec<SymbolEvaluation> = pool.install(|| {
        symbols
            .par_iter()
            .map(|symbol| evaluate_symbol(port, symbol, criteria))
            .collect()
    });

    let result = ScreeningResult::from_evaluations(evaluations);
    info!(
        screened = symbols.len(),
        matches = result.total_matches,
        workers,
        "parallel screen complete"
    );
    Ok(result)
}

/// Point-in-time view of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockSnapshot {
    pub symbol: String,
    pub company_name: Option<String>,
    pub pe_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub market_cap: Option<f64>,
    pub current_price: Option<f64>,
    /// Only reported with at least 200 closes.
    pub sma_200: Option<f64>,
    pub rsi: Option<f64>,
}

pub fn snapshot(port: &dyn MarketDataPort, symbol: &str) -> Result<StockSnapshot, EdgeFinderError> {
    let fundamentals = port.fundamentals(symbol)?;
    let prices = port.price_history(symbol, Lookback::OneYear)?;

    let (sma_200, rsi) = if prices.len() >= SMA_TREND_WINDOW {
        (
            calculate_sma(prices.bars(), SMA_TREND_WINDOW).latest(),
            calculate_rsi(prices.bars(), DEFAULT_RSI_PERIOD).latest(),
        )
    } else {
        (None, None)
    };

    Ok(StockSnapshot {
        symbol: symbol.to_string(),
        company_name: fundamentals.company_name,
        pe_ratio: fundamentals.pe_ratio,
        debt_to_equity: fundamentals.debt_to_equity,
        market_cap: fundamentals.market_cap,
        current_price: prices.latest_close(),
        sma_200,
        rsi,
    })
}
