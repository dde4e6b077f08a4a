//! Risk-based option position sizing.
//!
//! The stop is defined on the underlying. Loss per contract at the stop is
//! modelled as `per_share_risk * delta * 100 * buffer`, and the contract count
//! is the dollar risk budget divided by that loss, floored.
//!
//! A percent-drawdown cap (fraction of premium lost at the stop) can be
//! inverted into a threshold entry price on the underlying, or into the
//! minimum premium that keeps the drawdown within the cap.
//!
//! Every value here is unrounded; rounding is a presentation concern.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SHARES_PER_CONTRACT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SizingError {
    #[error("missing required parameter: {field}")]
    MissingParameter { field: &'static str },

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("account_size must be > 0, got {value}")]
    InvalidAccountSize { value: f64 },

    #[error("risk_pct must be in (0, 1], got {value}")]
    InvalidRiskPct { value: f64 },

    #[error("fixed_dollar_risk must be > 0, got {value}")]
    InvalidFixedRisk { value: f64 },

    #[error(
        "per-share risk is {value} for a {direction}; check the entry zone and stop placement"
    )]
    NonPositivePerShareRisk { direction: Direction, value: f64 },

    #[error("computed per-contract loss is {value}; check inputs")]
    NonPositivePerContractLoss { value: f64 },

    #[error("direction must be 'call' or 'put', got '{value}'")]
    InvalidDirection { value: String },

    #[error("delta must be > 0, got {value}")]
    InvalidDelta { value: f64 },

    #[error("buffer must be > 0, got {value}")]
    InvalidBuffer { value: f64 },

    #[error("pct_drawdown_cap must be > 0 (e.g. 0.10 for 10%), got {value}")]
    InvalidPctCap { value: f64 },

    #[error("est_entry_premium must be > 0, got {value}")]
    InvalidEntryPremium { value: f64 },

    #[error("max_premium_per_contract must be > 0, got {value}")]
    InvalidMaxPremium { value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Call,
    Put,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Call => write!(f, "call"),
            Direction::Put => write!(f, "put"),
        }
    }
}

impl FromStr for Direction {
    type Err = SizingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "call" => Ok(Direction::Call),
            "put" => Ok(Direction::Put),
            _ => Err(SizingError::InvalidDirection {
                value: s.to_string(),
            }),
        }
    }
}

/// Exactly one way of expressing the per-trade risk budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum RiskBudget {
    /// Fraction of the account, in (0, 1].
    Percent(f64),
    /// Dollars per trade.
    Fixed(f64),
}

impl RiskBudget {
    /// A fixed dollar amount wins over a percentage when both are given.
    pub fn from_options(risk_pct: Option<f64>, fixed_dollar_risk: Option<f64>) -> Option<Self> {
        fixed_dollar_risk
            .map(RiskBudget::Fixed)
            .or(risk_pct.map(RiskBudget::Percent))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingInput {
    pub account_size: f64,
    pub risk: RiskBudget,
    pub direction: Direction,
    pub entry_low: f64,
    pub entry_high: f64,
    pub stop: f64,
    pub delta: f64,
    pub buffer: f64,
    pub max_premium_per_contract: Option<f64>,
    /// Option price per underlying share; one contract costs 100x this.
    pub est_entry_premium: Option<f64>,
    /// Fraction of premium that may be lost at the stop.
    pub pct_drawdown_cap: Option<f64>,
}

impl SizingInput {
    /// Illustrative call trade: $5,000 account risking 1.5% with a 10% drawdown cap.
    pub fn example() -> Self {
        Self {
            account_size: 5000.0,
            risk: RiskBudget::Percent(0.015),
            direction: Direction::Call,
            entry_low: 210.20,
            entry_high: 210.50,
            stop: 209.20,
            delta: 0.40,
            buffer: 1.10,
            max_premium_per_contract: None,
            est_entry_premium: Some(2.50),
            pct_drawdown_cap: Some(0.10),
        }
    }

    /// Worst-case fill inside the entry zone for this direction.
    pub fn worst_case_entry(&self) -> f64 {
        match self.direction {
            Direction::Call => self.entry_high,
            Direction::Put => self.entry_low,
        }
    }

    fn validate(&self) -> Result<(), SizingError> {
        let risk_value = match self.risk {
            RiskBudget::Percent(v) | RiskBudget::Fixed(v) => v,
        };
        let required = [
            ("account_size", self.account_size),
            ("risk", risk_value),
            ("entry_low", self.entry_low),
            ("entry_high", self.entry_high),
            ("stop", self.stop),
            ("delta", self.delta),
            ("buffer", self.buffer),
        ];
        let optional = [
            ("max_premium_per_contract", self.max_premium_per_contract),
            ("est_entry_premium", self.est_entry_premium),
            ("pct_drawdown_cap", self.pct_drawdown_cap),
        ];
        for (field, value) in required
            .into_iter()
            .chain(optional.into_iter().filter_map(|(f, v)| v.map(|v| (f, v))))
        {
            if !value.is_finite() {
                return Err(SizingError::NonFinite { field });
            }
        }

        if self.account_size <= 0.0 {
            return Err(SizingError::InvalidAccountSize {
                value: self.account_size,
            });
        }
        check_greeks(self.delta, self.buffer)?;
        if let Some(premium) = self.est_entry_premium {
            check_premium(premium)?;
        }
        if let Some(cap) = self.pct_drawdown_cap {
            check_pct_cap(cap)?;
        }
        if let Some(max) = self.max_premium_per_contract {
            if max <= 0.0 {
                return Err(SizingError::InvalidMaxPremium { value: max });
            }
        }
        Ok(())
    }
}

fn check_greeks(delta: f64, buffer: f64) -> Result<(), SizingError> {
    if delta <= 0.0 {
        return Err(SizingError::InvalidDelta { value: delta });
    }
    if buffer <= 0.0 {
        return Err(SizingError::InvalidBuffer { value: buffer });
    }
    Ok(())
}

fn check_premium(premium: f64) -> Result<(), SizingError> {
    if premium <= 0.0 {
        return Err(SizingError::InvalidEntryPremium { value: premium });
    }
    Ok(())
}

fn check_pct_cap(cap: f64) -> Result<(), SizingError> {
    if cap <= 0.0 {
        return Err(SizingError::InvalidPctCap { value: cap });
    }
    Ok(())
}

/// Which side of the threshold the worst-case entry must stay on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdBound {
    /// Calls: entry must not exceed the threshold.
    Max,
    /// Puts: entry must not fall below the threshold.
    Min,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapThreshold {
    pub price: f64,
    pub bound: ThresholdBound,
    pub allowed_per_contract_loss: f64,
    pub allowed_per_share_risk: f64,
}

impl CapThreshold {
    /// Whether a worst-case entry at `entry` keeps the drawdown within the cap.
    pub fn admits(&self, entry: f64) -> bool {
        match self.bound {
            ThresholdBound::Max => entry <= self.price,
            ThresholdBound::Min => entry >= self.price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapCheck {
    #[serde(flatten)]
    pub threshold: CapThreshold,
    pub zone_respects_cap: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PremiumCap {
    pub pct_drawdown_cap: f64,
    /// Per-share premium below which the cap is breached at the stop.
    pub min_entry_premium: f64,
    pub min_entry_notional: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meets_cap: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affordability {
    pub checked: bool,
    pub affordable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_premium_per_contract: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingResult {
    pub input: SizingInput,
    pub dollar_risk: f64,
    pub per_share_risk: f64,
    pub per_contract_loss: f64,
    pub raw_contracts: f64,
    pub contracts: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_threshold: Option<CapCheck>,
    /// Percent (not fraction) of premium lost at the stop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pct_drawdown_at_stop: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_cap: Option<PremiumCap>,
    pub affordability: Affordability,
}

pub fn compute_dollar_risk(account_size: f64, risk: RiskBudget) -> Result<f64, SizingError> {
    match risk {
        RiskBudget::Fixed(amount) => {
            if amount <= 0.0 {
                return Err(SizingError::InvalidFixedRisk { value: amount });
            }
            Ok(amount)
        }
        RiskBudget::Percent(pct) => {
            if !(pct > 0.0 && pct <= 1.0) {
                return Err(SizingError::InvalidRiskPct { value: pct });
            }
            Ok(account_size * pct)
        }
    }
}

/// Adverse distance from the worst-case entry to the stop.
pub fn per_share_risk(
    direction: Direction,
    entry_low: f64,
    entry_high: f64,
    stop: f64,
) -> Result<f64, SizingError> {
    let risk = match direction {
        Direction::Call => entry_high - stop,
        Direction::Put => stop - entry_low,
    };
    if risk <= 0.0 {
        return Err(SizingError::NonPositivePerShareRisk {
            direction,
            value: risk,
        });
    }
    Ok(risk)
}

pub fn per_contract_loss_at_stop(
    per_share_risk: f64,
    delta: f64,
    buffer: f64,
) -> Result<f64, SizingError> {
    let loss = per_share_risk * delta * SHARES_PER_CONTRACT * buffer;
    if loss <= 0.0 {
        return Err(SizingError::NonPositivePerContractLoss { value: loss });
    }
    Ok(loss)
}

/// Inverts `loss = r * delta * 100 * buffer` for `r`.
pub fn allowed_per_share_risk_for_cap(
    per_contract_loss_cap: f64,
    delta: f64,
    buffer: f64,
) -> Result<f64, SizingError> {
    check_greeks(delta, buffer)?;
    Ok(per_contract_loss_cap / (delta * SHARES_PER_CONTRACT * buffer))
}

/// Underlying entry price at which the drawdown at the stop equals `pct_cap`.
pub fn entry_threshold_for_cap(
    direction: Direction,
    stop: f64,
    est_entry_premium: f64,
    pct_cap: f64,
    delta: f64,
    buffer: f64,
) -> Result<CapThreshold, SizingError> {
    check_pct_cap(pct_cap)?;
    check_premium(est_entry_premium)?;

    let allowed_per_contract_loss = pct_cap * est_entry_premium * SHARES_PER_CONTRACT;
    let allowed_per_share_risk =
        allowed_per_share_risk_for_cap(allowed_per_contract_loss, delta, buffer)?;

    let (price, bound) = match direction {
        Direction::Call => (stop + allowed_per_share_risk, ThresholdBound::Max),
        Direction::Put => (stop - allowed_per_share_risk, ThresholdBound::Min),
    };

    Ok(CapThreshold {
        price,
        bound,
        allowed_per_contract_loss,
        allowed_per_share_risk,
    })
}

/// Fraction of premium lost at the stop for a worst-case fill at `entry`.
pub fn pct_drawdown_at(
    direction: Direction,
    entry: f64,
    stop: f64,
    delta: f64,
    buffer: f64,
    est_entry_premium: f64,
) -> Result<f64, SizingError> {
    check_greeks(delta, buffer)?;
    check_premium(est_entry_premium)?;
    let r_share = per_share_risk(direction, entry, entry, stop)?;
    let loss = per_contract_loss_at_stop(r_share, delta, buffer)?;
    Ok(loss / (est_entry_premium * SHARES_PER_CONTRACT))
}

pub fn size_contracts(input: &SizingInput) -> Result<SizingResult, SizingError> {
    input.validate()?;

    let dollar_risk = compute_dollar_risk(input.account_size, input.risk)?;
    let r_share = per_share_risk(input.direction, input.entry_low, input.entry_high, input.stop)?;
    let per_contract_loss = per_contract_loss_at_stop(r_share, input.delta, input.buffer)?;

    let raw_contracts = dollar_risk / per_contract_loss;
    let contracts = raw_contracts.max(0.0).floor() as u64;

    let cap_threshold = match (input.est_entry_premium, input.pct_drawdown_cap) {
        (Some(premium), Some(cap)) => {
            let threshold = entry_threshold_for_cap(
                input.direction,
                input.stop,
                premium,
                cap,
                input.delta,
                input.buffer,
            )?;
            Some(CapCheck {
                threshold,
                zone_respects_cap: threshold.admits(input.worst_case_entry()),
            })
        }
        _ => None,
    };

    let pct_drawdown_at_stop = input
        .est_entry_premium
        .map(|premium| per_contract_loss / (premium * SHARES_PER_CONTRACT) * 100.0);

    let premium_cap = input.pct_drawdown_cap.map(|cap| {
        let min_entry_premium = per_contract_loss / (cap * SHARES_PER_CONTRACT);
        PremiumCap {
            pct_drawdown_cap: cap,
            min_entry_premium,
            min_entry_notional: min_entry_premium * SHARES_PER_CONTRACT,
            meets_cap: input.est_entry_premium.map(|p| p >= min_entry_premium),
        }
    });

    let affordability = match (input.max_premium_per_contract, input.est_entry_premium) {
        (Some(max), Some(est)) => Affordability {
            checked: true,
            affordable: est <= max,
            max_premium_per_contract: Some(max),
        },
        _ => Affordability {
            checked: false,
            affordable: true,
            max_premium_per_contract: input.max_premium_per_contract,
        },
    };

    Ok(SizingResult {
        input: input.clone(),
        dollar_risk,
        per_share_risk: r_share,
        per_contract_loss,
        raw_contracts,
        contracts,
        cap_threshold,
        pct_drawdown_at_stop,
        premium_cap,
        affordability,
    })
}
