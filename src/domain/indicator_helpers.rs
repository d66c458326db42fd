//! Shared helpers for indicator calculations.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

/// Wilder Average True Range: seed with the simple mean of the first n true
/// ranges, then ATR = (prev_ATR * (n-1) + TR) / n. The first bar's true range
/// is high - low (no previous close).
pub fn calc_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if bars.len() < period || period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Atr(period),
            values: vec![],
        };
    }

    let mut tr_values: Vec<f64> = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let tr = if i == 0 {
            bar.high - bar.low
        } else {
            bar.true_range(bars[i - 1].close)
        };
        tr_values.push(tr);
    }

    let mut results: Vec<IndicatorPoint> = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        if i < period - 1 {
            results.push(IndicatorPoint {
                date: bars[i].date,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
        } else if i == period - 1 {
            let seed: f64 = tr_values[0..=i].iter().sum::<f64>() / period as f64;
            results.push(IndicatorPoint {
                date: bars[i].date,
                valid: true,
                value: IndicatorValue::Simple(seed),
            });
        } else {
            let prev_atr = match &results[i - 1].value {
                IndicatorValue::Simple(v) => *v,
                _ => 0.0,
            };
            let atr = (prev_atr * (period - 1) as f64 + tr_values[i]) / period as f64;
            results.push(IndicatorPoint {
                date: bars[i].date,
                valid: true,
                value: IndicatorValue::Simple(atr),
            });
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values: results,
    }
}
