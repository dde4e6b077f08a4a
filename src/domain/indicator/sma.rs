//! Simple Moving Average.
//!
//! SMA[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price_series::PriceBar;

pub fn calculate_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Sma(period),
            values: bars.iter().map(|b| IndicatorPoint::invalid(b.date)).collect(),
        };
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i + 1 < period {
                IndicatorPoint::invalid(bar.date)
            } else {
                let window = &bars[i + 1 - period..=i];
                let mean = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
                IndicatorPoint::valid(bar.date, mean)
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

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
    fn sma_warmup_and_values() {
        let series = calculate_sma(&make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!((series.values[2].value - 2.0).abs() < 1e-12);
        assert!((series.values[3].value - 3.0).abs() < 1e-12);
        assert_eq!(series.latest(), Some(4.0));
    }

    #[test]
    fn sma_shorter_than_window_is_undefined() {
        let closes: Vec<f64> = (0..199).map(|i| i as f64).collect();
        let series = calculate_sma(&make_bars(&closes), 200);
        assert_eq!(series.values.len(), 199);
        assert_eq!(series.latest(), None);
    }

    #[test]
    fn sma_200_on_exact_window() {
        let closes: Vec<f64> = (1..=200).map(|i| i as f64).collect();
        let series = calculate_sma(&make_bars(&closes), 200);
        assert_eq!(series.valid_count(), 1);
        approx::assert_relative_eq!(series.latest().unwrap(), 100.5);
    }

    #[test]
    fn sma_zero_period() {
        let series = calculate_sma(&make_bars(&[1.0, 2.0]), 0);
        assert!(series.values.iter().all(|p| !p.valid));
        assert_eq!(series.indicator_type, IndicatorType::Sma(0));
    }
}
