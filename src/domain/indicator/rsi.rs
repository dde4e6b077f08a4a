//! RSI (Relative Strength Index).
//!
//! Gains and losses of successive closes are averaged with a trailing simple
//! mean over `period` changes:
//!
//! RSI = 100 - (100 / (1 + mean_gain / mean_loss))
//!
//! If mean_loss == 0: RSI = 100, or 50 when the window is flat (no gains either).
//!
//! Warmup: the first `period` bars are invalid (need `period` price changes).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price_series::PriceBar;

pub fn calculate_rsi(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < 2 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values: bars.iter().map(|b| IndicatorPoint::invalid(b.date)).collect(),
        };
    }

    let mut gains: Vec<f64> = Vec::with_capacity(bars.len() - 1);
    let mut losses: Vec<f64> = Vec::with_capacity(bars.len() - 1);
    for pair in bars.windows(2) {
        let change = pair[1].close - pair[0].close;
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let mut values = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i < period {
            values.push(IndicatorPoint::invalid(bar.date));
            continue;
        }
        // Changes ending at bar i occupy gains[i - period..i].
        let window = i - period..i;
        let mean_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let mean_loss = losses[window].iter().sum::<f64>() / period as f64;
        values.push(IndicatorPoint::valid(bar.date, rsi_from_means(mean_gain, mean_loss)));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_means(mean_gain: f64, mean_loss: f64) -> f64 {
    if mean_loss == 0.0 {
        if mean_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + mean_gain / mean_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                close,
            })
            .collect()
    }

    #[test]
    fn rsi_empty_bars() {
        let series = calculate_rsi(&[], 14);
        assert_eq!(series.values.len(), 0);
        assert_eq!(series.latest(), None);
    }

    #[test]
    fn rsi_single_bar() {
        let series = calculate_rsi(&make_bars(&[100.0]), 14);
        assert_eq!(series.values.len(), 1);
        assert!(!series.values[0].valid);
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let series = calculate_rsi(&make_bars(&closes), 14);

        assert_eq!(series.values.len(), 15);
        for i in 0..14 {
            assert!(!series.values[i].valid, "Bar {} should be invalid", i);
        }
        assert!(series.values[14].valid, "Bar 14 should be valid");
    }

    #[test]
    fn rsi_undefined_with_exactly_period_bars() {
        let closes: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&make_bars(&closes), 14);
        assert_eq!(series.latest(), None);
    }

    #[test]
    fn rsi_all_gains_saturates_at_100() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&make_bars(&closes), 14);
        assert_eq!(series.latest(), Some(100.0));
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&make_bars(&closes), 14);
        assert_eq!(series.latest(), Some(0.0));
    }

    #[test]
    fn rsi_flat_window_is_neutral() {
        let series = calculate_rsi(&make_bars(&[50.0; 20]), 14);
        assert_eq!(series.latest(), Some(50.0));
    }

    #[test]
    fn rsi_uses_simple_trailing_mean() {
        // period 2: changes +2, -1, +3 → last window = [-1, +3]
        let series = calculate_rsi(&make_bars(&[10.0, 12.0, 11.0, 14.0]), 2);
        let expected = 100.0 - 100.0 / (1.0 + (3.0 / 2.0) / (1.0 / 2.0));
        approx::assert_relative_eq!(series.latest().unwrap(), expected, epsilon = 1e-12);
        approx::assert_relative_eq!(series.latest().unwrap(), 75.0, epsilon = 1e-12);
    }

    #[test]
    fn rsi_window_drops_old_changes() {
        // period 2: changes -5, +1, +1 → last window has no losses
        let series = calculate_rsi(&make_bars(&[20.0, 15.0, 16.0, 17.0]), 2);
        assert!(series.values[2].valid);
        approx::assert_relative_eq!(series.values[2].value, 100.0 - 100.0 / (1.0 + 0.5 / 2.5));
        assert_eq!(series.latest(), Some(100.0));
    }

    #[test]
    fn rsi_indicator_type() {
        let series = calculate_rsi(&make_bars(&[100.0]), 14);
        assert_eq!(series.indicator_type, IndicatorType::Rsi(14));
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&make_bars(&[100.0, 101.0]), 0);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    proptest! {
        #[test]
        fn rsi_always_within_bounds(closes in prop::collection::vec(1.0f64..1000.0, 15..120)) {
            let series = calculate_rsi(&make_bars(&closes), 14);
            for point in series.values.iter().filter(|p| p.valid) {
                prop_assert!((0.0..=100.0).contains(&point.value), "RSI {} out of range", point.value);
            }
            prop_assert!(series.latest().is_some());
        }
    }
}
