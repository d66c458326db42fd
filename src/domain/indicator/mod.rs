//! Technical indicator implementations.
//!
//! Indicator output is represented as a time series aligned with the input
//! bars: one [`IndicatorPoint`] per bar, with `valid = false` during the
//! indicator's warmup window. Consumers that only need "the current value"
//! take the last valid point and substitute a documented default when the
//! series never becomes valid.

pub mod sma;
pub mod ema;
pub mod rsi;
pub mod macd;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// The nth valid Simple value counting back from the end (0 = latest).
    pub fn nth_last_simple(&self, n: usize) -> Option<f64> {
        self.values
            .iter()
            .rev()
            .filter(|p| p.valid)
            .nth(n)
            .and_then(|p| match p.value {
                IndicatorValue::Simple(v) => Some(v),
                _ => None,
            })
    }

    /// The latest valid Simple value.
    pub fn last_simple(&self) -> Option<f64> {
        self.nth_last_simple(0)
    }

    /// The latest valid MACD triple as (line, signal, histogram).
    pub fn last_macd(&self) -> Option<(f64, f64, f64)> {
        self.values.iter().rev().filter(|p| p.valid).find_map(|p| {
            match p.value {
                IndicatorValue::Macd {
                    line,
                    signal,
                    histogram,
                } => Some((line, signal, histogram)),
                _ => None,
            }
        })
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_point(day: u32, valid: bool, value: f64) -> IndicatorPoint {
        IndicatorPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            valid,
            value: IndicatorValue::Simple(value),
        }
    }

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Sma(50).to_string(), "SMA(50)");
        assert_eq!(IndicatorType::Atr(14).to_string(), "ATR(14)");
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn nth_last_simple_skips_warmup_points() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Sma(2),
            values: vec![
                simple_point(1, false, 0.0),
                simple_point(2, true, 10.0),
                simple_point(3, true, 20.0),
            ],
        };
        assert_eq!(series.last_simple(), Some(20.0));
        assert_eq!(series.nth_last_simple(1), Some(10.0));
        assert_eq!(series.nth_last_simple(2), None);
    }

    #[test]
    fn last_simple_none_when_never_valid() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Rsi(14),
            values: vec![simple_point(1, false, 0.0)],
        };
        assert_eq!(series.last_simple(), None);
    }

    #[test]
    fn last_macd_returns_triple() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Macd {
                fast: 12,
                slow: 26,
                signal: 9,
            },
            values: vec![IndicatorPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                valid: true,
                value: IndicatorValue::Macd {
                    line: 1.5,
                    signal: 1.0,
                    histogram: 0.5,
                },
            }],
        };
        assert_eq!(series.last_macd(), Some((1.5, 1.0, 0.5)));
    }
}
