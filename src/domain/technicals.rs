//! Per-symbol technical signal computation.
//!
//! Pulls one OHLCV history through the indicator layer and reduces each
//! series to its latest value. Histories shorter than an indicator's window
//! degrade to a documented neutral default instead of failing: RSI 50,
//! SMA = latest close (so price-vs-SMA reads 0%), MACD and ATR 0. Callers
//! must treat ATR 0 as "volatility unknown", not "no volatility".

use serde::{Deserialize, Serialize};

use crate::domain::indicator::macd::calculate_macd_default;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator_helpers::calc_atr;
use crate::domain::ohlcv::{sort_ascending, OhlcvBar};

pub const RSI_PERIOD: usize = 14;
pub const SMA_SHORT_PERIOD: usize = 50;
pub const SMA_LONG_PERIOD: usize = 200;
pub const ATR_PERIOD: usize = 14;

/// Neutral RSI reported when history is shorter than the indicator window.
pub const RSI_NEUTRAL: f64 = 50.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacdSnapshot {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Derived, symbol-keyed signal set; re-derivable at any time from a
/// sufficiently long history and never mutated independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSignals {
    pub symbol: String,
    pub rsi14: f64,
    pub sma50: f64,
    pub sma200: f64,
    pub macd: MacdSnapshot,
    pub atr14: f64,
    pub price_vs_sma50: f64,
    pub price_vs_sma200: f64,
    pub golden_cross: bool,
    pub death_cross: bool,
    pub relative_strength_vs_benchmark: f64,
}

/// Compute the full signal set for one symbol.
///
/// Input order is not trusted; the series is sorted ascending by date before
/// any indicator runs. Given identical inputs the output is bit-identical —
/// no clock, no randomness, no state across calls.
pub fn compute_technicals(
    symbol: &str,
    bars: &[OhlcvBar],
    benchmark: Option<&[OhlcvBar]>,
) -> TechnicalSignals {
    let sorted = sort_ascending(bars);
    let closes: Vec<f64> = sorted.iter().map(|b| b.close).collect();
    let current_price = closes.last().copied().unwrap_or(0.0);

    let rsi14 = calculate_rsi(&sorted, RSI_PERIOD)
        .last_simple()
        .unwrap_or(RSI_NEUTRAL);

    let sma50_series = calculate_sma(&sorted, SMA_SHORT_PERIOD);
    let sma200_series = calculate_sma(&sorted, SMA_LONG_PERIOD);
    let sma50 = sma50_series.last_simple().unwrap_or(current_price);
    let sma200 = sma200_series.last_simple().unwrap_or(current_price);

    // Cross detection needs the previous SMA pair. With fewer than two valid
    // points the previous value is taken equal to the current, so a freshly
    // valid series cannot fire a spurious cross.
    let prev_sma50 = sma50_series.nth_last_simple(1).unwrap_or(sma50);
    let prev_sma200 = sma200_series.nth_last_simple(1).unwrap_or(sma200);

    // Strict crossing between the last two bars, not merely "above"/"below".
    let golden_cross = prev_sma50 <= prev_sma200 && sma50 > sma200;
    let death_cross = prev_sma50 >= prev_sma200 && sma50 < sma200;

    let macd = match calculate_macd_default(&sorted).last_macd() {
        Some((line, signal, histogram)) => MacdSnapshot {
            macd: line,
            signal,
            histogram,
        },
        None => MacdSnapshot::default(),
    };

    let atr14 = calc_atr(&sorted, ATR_PERIOD).last_simple().unwrap_or(0.0);

    let price_vs_sma50 = if sma50 > 0.0 {
        (current_price - sma50) / sma50 * 100.0
    } else {
        0.0
    };
    let price_vs_sma200 = if sma200 > 0.0 {
        (current_price - sma200) / sma200 * 100.0
    } else {
        0.0
    };

    let relative_strength_vs_benchmark = benchmark
        .map(|b| relative_strength(&closes, b))
        .unwrap_or(0.0);

    TechnicalSignals {
        symbol: symbol.to_string(),
        rsi14,
        sma50,
        sma200,
        macd,
        atr14,
        price_vs_sma50,
        price_vs_sma200,
        golden_cross,
        death_cross,
        relative_strength_vs_benchmark,
    }
}

/// Percent total return of the holding over its window minus the benchmark's
/// over the same span; 0 unless both series have at least two points.
fn relative_strength(closes: &[f64], benchmark: &[OhlcvBar]) -> f64 {
    if closes.len() < 2 {
        return 0.0;
    }
    let bench = sort_ascending(benchmark);
    let bench_closes: Vec<f64> = bench.iter().map(|b| b.close).collect();
    if bench_closes.len() < 2 {
        return 0.0;
    }
    let first = closes[0];
    let bench_first = bench_closes[0];
    if first == 0.0 || bench_first == 0.0 {
        return 0.0;
    }
    let holding_return = (closes[closes.len() - 1] / first - 1.0) * 100.0;
    let bench_return = (bench_closes[bench_closes.len() - 1] / bench_first - 1.0) * 100.0;
    holding_return - bench_return
}
