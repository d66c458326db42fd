//! RSI (Relative Strength Index) indicator.
//!
//! Uses Wilder's smoothing for average gain/loss:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)); 100 when avg_loss == 0.
//! Warmup: the first n bars are invalid (n price changes are required).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < 2 {
        let values: Vec<IndicatorPoint> = bars
            .iter()
            .map(|b| IndicatorPoint {
                date: b.date,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            })
            .collect();

        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values,
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    values.push(IndicatorPoint {
        date: bars[0].date,
        valid: false,
        value: IndicatorValue::Simple(0.0),
    });

    let mut gains: Vec<f64> = Vec::new();
    let mut losses: Vec<f64> = Vec::new();

    for i in 1..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, bar) in bars.iter().enumerate().skip(1) {
        let change_idx = i - 1;

        if change_idx < period - 1 {
            values.push(IndicatorPoint {
                date: bar.date,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
        } else {
            if change_idx == period - 1 {
                avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
                avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
            } else {
                avg_gain = (avg_gain * (period - 1) as f64 + gains[change_idx]) / period as f64;
                avg_loss = (avg_loss * (period - 1) as f64 + losses[change_idx]) / period as f64;
            }
            let rsi = if avg_loss == 0.0 {
                100.0
            } else {
                100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
            };
            values.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Simple(rsi),
            });
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day_offset: i64, close: f64) -> OhlcvBar {
        OhlcvBar {
            symbol: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                + chrono::Duration::days(day_offset),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn rsi_empty_bars() {
        let series = calculate_rsi(&[], 14);
        assert_eq!(series.values.len(), 0);
    }

    #[test]
    fn rsi_single_bar_invalid() {
        let bars = vec![make_bar(0, 100.0)];
        let series = calculate_rsi(&bars, 14);
        assert_eq!(series.values.len(), 1);
        assert!(!series.values[0].valid);
    }

    #[test]
    fn rsi_warmup_period() {
        let bars: Vec<OhlcvBar> = (0..15)
            .map(|i| make_bar(i, 100.0 + (i as f64 % 5.0) * 2.0))
            .collect();

        let series = calculate_rsi(&bars, 14);
        assert_eq!(series.values.len(), 15);

        for i in 0..14 {
            assert!(!series.values[i].valid, "bar {} should be invalid", i);
        }
        assert!(series.values[14].valid, "bar 14 should be valid");
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let bars: Vec<OhlcvBar> = (0..15).map(|i| make_bar(i, 100.0 + i as f64)).collect();
        let series = calculate_rsi(&bars, 14);

        if let IndicatorValue::Simple(rsi) = series.values[14].value {
            assert!((rsi - 100.0).abs() < f64::EPSILON);
        } else {
            panic!("Expected Simple value");
        }
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let bars: Vec<OhlcvBar> = (0..15).map(|i| make_bar(i, 100.0 - i as f64)).collect();
        let series = calculate_rsi(&bars, 14);

        if let IndicatorValue::Simple(rsi) = series.values[14].value {
            assert!(rsi.abs() < f64::EPSILON);
        } else {
            panic!("Expected Simple value");
        }
    }

    #[test]
    fn rsi_stays_in_range() {
        let bars: Vec<OhlcvBar> = (0..40)
            .map(|i| make_bar(i, 100.0 + (i as f64 % 7.0 - 3.0) * 2.0))
            .collect();

        let series = calculate_rsi(&bars, 14);
        for point in &series.values {
            if point.valid {
                if let IndicatorValue::Simple(rsi) = point.value {
                    assert!((0.0..=100.0).contains(&rsi), "RSI {} out of range", rsi);
                }
            }
        }
    }

    #[test]
    fn rsi_zero_period_never_valid() {
        let bars = vec![make_bar(0, 100.0), make_bar(1, 101.0)];
        let series = calculate_rsi(&bars, 0);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn rsi_uptrend_is_bullish() {
        let closes = [
            44.0, 44.25, 44.5, 43.75, 44.5, 44.25, 44.75, 45.25, 45.5, 45.25, 45.5, 46.0, 46.25,
            46.0, 46.5,
        ];
        let bars: Vec<OhlcvBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| make_bar(i as i64, c))
            .collect();

        let series = calculate_rsi(&bars, 14);
        assert!(series.values[14].valid);
        if let IndicatorValue::Simple(rsi) = series.values[14].value {
            assert!(rsi > 50.0 && rsi < 100.0);
        }
    }
}
