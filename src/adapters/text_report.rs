//! Plain-text console reports.
//!
//! Rounding happens here only: dollar amounts to 2 dp, per-share values and
//! thresholds to 4 dp, percentages to 2 dp.

use crate::domain::screener::{Outcome, ScreeningResult, StockSnapshot};
use crate::domain::sizing::{RiskBudget, SizingResult, ThresholdBound};

fn yes_no(value: bool) -> &'static str {
    if value { "YES" } else { "NO" }
}

fn line(output: &mut String, label: &str, value: impl AsRef<str>) {
    output.push_str(&format!("{:<25}: {}\n", label, value.as_ref()));
}

pub fn render_sizing(result: &SizingResult) -> String {
    let input = &result.input;
    let mut output = String::new();
    output.push_str("=== Option Position Sizer ===\n");

    line(&mut output, "Contracts (floor)", result.contracts.to_string());
    line(&mut output, "Raw contracts", format!("{:.3}", result.raw_contracts));

    if let Some(cap) = &result.cap_threshold {
        let label = match cap.threshold.bound {
            ThresholdBound::Max => "Max entry (underlying)",
            ThresholdBound::Min => "Min entry (underlying)",
        };
        line(
            &mut output,
            label,
            format!("{:.4}  (to keep drawdown <= cap)", cap.threshold.price),
        );
        line(
            &mut output,
            "Allowed $/share risk cap",
            format!("${:.4}", cap.threshold.allowed_per_share_risk),
        );
        line(&mut output, "Planned zone within cap?", yes_no(cap.zone_respects_cap));
    }

    line(
        &mut output,
        "Per-contract loss @ stop",
        format!("${:.2}", result.per_contract_loss),
    );

    if let (Some(premium), Some(drawdown)) = (input.est_entry_premium, result.pct_drawdown_at_stop) {
        line(
            &mut output,
            "Est. entry premium",
            format!("${:.4}  (~${:.2} per contract)", premium, premium * 100.0),
        );
        line(&mut output, "Drawdown @ stop", format!("{:.2}% of premium", drawdown));
    }

    match input.risk {
        RiskBudget::Fixed(_) => {
            line(&mut output, "Risk (fixed)", format!("${:.2}", result.dollar_risk));
        }
        RiskBudget::Percent(pct) => {
            line(
                &mut output,
                "Risk (% of account)",
                format!("{:.2}% -> ${:.2}", pct * 100.0, result.dollar_risk),
            );
        }
    }

    line(
        &mut output,
        "Entry zone (low -> high)",
        format!("{} -> {}", input.entry_low, input.entry_high),
    );
    line(&mut output, "Stop (underlying)", input.stop.to_string());
    line(&mut output, "Delta (est.)", format!("{:.2}", input.delta));
    line(&mut output, "Buffer", format!("{:.2}", input.buffer));
    line(&mut output, "Per-share risk", format!("${:.4}", result.per_share_risk));
    line(&mut output, "Direction", input.direction.to_string().to_uppercase());
    line(&mut output, "Account size", format!("${:.2}", input.account_size));

    if let Some(cap) = &result.premium_cap {
        line(
            &mut output,
            "Max allowed drawdown",
            format!("{:.2}% of premium", cap.pct_drawdown_cap * 100.0),
        );
        line(
            &mut output,
            "Min premium to meet cap",
            format!(
                "${:.4}  (~${:.2}/contract)",
                cap.min_entry_premium, cap.min_entry_notional
            ),
        );
        if let Some(meets) = cap.meets_cap {
            line(&mut output, "Meets drawdown cap?", yes_no(meets));
        }
    }

    if result.affordability.checked {
        line(&mut output, "Affordability checked", "True");
        if let Some(max) = result.affordability.max_premium_per_contract {
            line(&mut output, "  Max premium/contract", format!("${:.2}", max));
        }
        line(&mut output, "  Affordable?", yes_no(result.affordability.affordable));
    }

    output
}

pub fn render_screening(result: &ScreeningResult) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "=== Screen: {} of {} matched ===\n",
        result.total_matches,
        result.evaluations.len()
    ));
    for evaluation in &result.evaluations {
        let status = match &evaluation.outcome {
            Outcome::Matched => "MATCH".to_string(),
            Outcome::Rejected { detail } => format!("no match ({})", detail),
            Outcome::Excluded { error } => format!("skipped ({})", error),
        };
        output.push_str(&format!("  {:<8} {}\n", evaluation.symbol, status));
    }
    output
}

fn optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "N/A".to_string(),
    }
}

pub fn render_snapshot(snapshot: &StockSnapshot) -> String {
    let mut output = String::new();
    output.push_str(&format!("=== {} ===\n", snapshot.symbol));
    line(
        &mut output,
        "Company",
        snapshot.company_name.as_deref().unwrap_or("N/A"),
    );
    line(&mut output, "Current price", optional(snapshot.current_price, 2));
    line(&mut output, "P/E (trailing)", optional(snapshot.pe_ratio, 2));
    line(&mut output, "Debt/Equity", optional(snapshot.debt_to_equity, 2));
    line(&mut output, "Market cap", optional(snapshot.market_cap, 0));
    line(&mut output, "SMA(200)", optional(snapshot.sma_200, 2));
    line(&mut output, "RSI(14)", optional(snapshot.rsi, 2));
    output
}
