//! OHLCV bar representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily price bar. Indicator computations require bars sorted ascending
/// by date; [`sort_ascending`] is the canonical way to establish that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OhlcvBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Sorted copy of a bar slice, ascending by date. Callers hand histories to
/// the indicator layer in whatever order their source produced; every entry
/// point sorts defensively rather than trusting it.
pub fn sort_ascending(bars: &[OhlcvBar]) -> Vec<OhlcvBar> {
    let mut sorted = bars.to_vec();
    sorted.sort_by_key(|b| b.date);
    sorted
}
