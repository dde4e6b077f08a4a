//! HTTP request handlers for web adapter.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::domain::criteria::ScreeningCriteria;
use crate::domain::error::EdgeFinderError;
use crate::domain::screener::{self, StockSnapshot};
use crate::domain::sizing::{self, Direction, RiskBudget, SizingError, SizingInput, SizingResult};
use crate::domain::universe::{parse_symbol, parse_symbols};

use super::{AppState, WebError};

/// Buffer applied when a sizing request leaves it out.
pub const DEFAULT_BUFFER: f64 = 1.10;

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Edge Finder API" }))
}

pub async fn not_found() -> WebError {
    WebError::not_found("Not Found")
}

#[derive(Debug, Default, Deserialize)]
pub struct ScreenerRequest {
    pub pe_ratio_max: Option<f64>,
    pub pe_ratio_min: Option<f64>,
    pub debt_to_equity_max: Option<f64>,
    pub debt_to_equity_min: Option<f64>,
    pub rsi_threshold_upper: Option<f64>,
    pub rsi_threshold_lower: Option<f64>,
    pub sma_200_above: Option<bool>,
    pub sma_200_below: Option<bool>,
    pub symbols: Option<Vec<String>>,
}

impl ScreenerRequest {
    pub fn criteria(&self) -> ScreeningCriteria {
        ScreeningCriteria {
            pe_max: self.pe_ratio_max,
            pe_min: self.pe_ratio_min,
            debt_to_equity_max: self.debt_to_equity_max,
            debt_to_equity_min: self.debt_to_equity_min,
            rsi_upper: self.rsi_threshold_upper,
            rsi_lower: self.rsi_threshold_lower,
            sma_above: self.sma_200_above,
            sma_below: self.sma_200_below,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScreenerResponse {
    pub symbols: Vec<String>,
    pub total_matches: usize,
}

pub async fn run_screener(
    State(state): State<Arc<AppState>>,
    request: Result<Json<ScreenerRequest>, JsonRejection>,
) -> Result<Json<ScreenerResponse>, WebError> {
    let Json(request) = request?;
    let criteria = request.criteria();
    criteria.validate()?;

    let symbols = match request.symbols.as_deref() {
        Some(list) if !list.is_empty() => {
            parse_symbols(&list.join(",")).map_err(EdgeFinderError::from)?
        }
        _ => state.universe.default_universe()?,
    };

    let worker_state = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || {
        screener::screen_parallel(
            &*worker_state.market_data,
            &symbols,
            &criteria,
            worker_state.max_workers,
        )
    })
    .await
    .map_err(|e| WebError::internal(format!("screening task failed: {}", e)))??;

    Ok(Json(ScreenerResponse {
        symbols: result.symbols,
        total_matches: result.total_matches,
    }))
}

pub async fn stock_snapshot(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<StockSnapshot>, WebError> {
    let symbol = parse_symbol(&symbol).map_err(EdgeFinderError::from)?;

    let worker_state = Arc::clone(&state);
    let lookup = symbol.clone();
    let snapshot = tokio::task::spawn_blocking(move || {
        screener::snapshot(&*worker_state.market_data, &lookup)
    })
    .await
    .map_err(|e| WebError::internal(format!("snapshot task failed: {}", e)))??;

    if snapshot.current_price.is_none() {
        return Err(EdgeFinderError::NoData { symbol }.into());
    }
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct SizerRequest {
    pub account_size: f64,
    pub risk_pct: Option<f64>,
    pub fixed_dollar_risk: Option<f64>,
    pub direction: String,
    pub entry_low: f64,
    pub entry_high: f64,
    pub stop: f64,
    pub delta: f64,
    pub buffer: Option<f64>,
    pub max_premium_per_contract: Option<f64>,
    pub est_entry_premium: Option<f64>,
    pub pct_drawdown_cap: Option<f64>,
}

impl SizerRequest {
    pub fn into_input(self) -> Result<SizingInput, SizingError> {
        let risk = RiskBudget::from_options(self.risk_pct, self.fixed_dollar_risk).ok_or(
            SizingError::MissingParameter {
                field: "risk_pct or fixed_dollar_risk",
            },
        )?;
        Ok(SizingInput {
            account_size: self.account_size,
            risk,
            direction: self.direction.parse::<Direction>()?,
            entry_low: self.entry_low,
            entry_high: self.entry_high,
            stop: self.stop,
            delta: self.delta,
            buffer: self.buffer.unwrap_or(DEFAULT_BUFFER),
            max_premium_per_contract: self.max_premium_per_contract,
            est_entry_premium: self.est_entry_premium,
            pct_drawdown_cap: self.pct_drawdown_cap,
        })
    }
}

pub async fn run_sizer(
    request: Result<Json<SizerRequest>, JsonRejection>,
) -> Result<Json<SizingResult>, WebError> {
    let Json(request) = request?;
    let input = request.into_input()?;
    Ok(Json(sizing::size_contracts(&input)?))
}
