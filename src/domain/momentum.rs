//! Momentum scoring: five weighted signal components fused into one bounded
//! score with a trend and trade-signal classification.
//!
//! The weight and threshold tables below are hand-tuned product policy.
//! They are intentionally fixed constants, not fitted parameters; changing
//! them requires product sign-off.

use serde::{Deserialize, Serialize};

use crate::domain::technicals::TechnicalSignals;

/// Component caps. Each component is clamped independently before the sum.
const RSI_CAP: f64 = 25.0;
const SMA50_CAP: f64 = 20.0;
const SMA200_CAP: f64 = 15.0;
const MACD_CAP: f64 = 20.0;
const RELATIVE_STRENGTH_CAP: f64 = 20.0;

/// RSI component bands.
const RSI_SWEET_SPOT_SCORE: f64 = 25.0; // RSI in [50, 65]
const RSI_EXTENDED_SCORE: f64 = 15.0; // RSI in (65, 70]
const RSI_OVERBOUGHT_DECAY: f64 = 2.5; // per RSI point above 70
const RSI_NEUTRAL_WEAK_SCORE: f64 = 5.0; // RSI in [40, 50)
const RSI_WEAK_SCORE: f64 = -10.0; // RSI in [30, 40)
const RSI_OVERSOLD_BASE: f64 = -15.0; // below 30, decaying by 1 per point
const RSI_OVERSOLD_DECAY: f64 = 1.0;

/// Multipliers applied before clamping.
const SMA50_MULTIPLIER: f64 = 2.0;
const SMA200_MULTIPLIER: f64 = 1.0;
const MACD_MULTIPLIER: f64 = 10.0;
const RELATIVE_STRENGTH_MULTIPLIER: f64 = 1.0;

const SCORE_CAP: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Accelerating,
    Steady,
    Decelerating,
    RollingOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSignal {
    StrongBuy,
    Buy,
    Hold,
    Caution,
    Sell,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Trend::Accelerating => "accelerating",
            Trend::Steady => "steady",
            Trend::Decelerating => "decelerating",
            Trend::RollingOver => "rolling_over",
        };
        write!(f, "{}", label)
    }
}

impl std::fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TradeSignal::StrongBuy => "strong_buy",
            TradeSignal::Buy => "buy",
            TradeSignal::Hold => "hold",
            TradeSignal::Caution => "caution",
            TradeSignal::Sell => "sell",
        };
        write!(f, "{}", label)
    }
}

/// Stateless transform of [`TechnicalSignals`]; no history of past scores is
/// kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MomentumScore {
    pub symbol: String,
    /// Rounded sum of the five components, in [-100, 100].
    pub score: i32,
    pub trend: Trend,
    pub signal: TradeSignal,
}

/// Fuse the signal set into a bounded momentum score.
///
/// Pure function: no clock, no state. Identical inputs produce identical
/// output.
pub fn compute_momentum(signals: &TechnicalSignals) -> MomentumScore {
    let rsi_score = rsi_component(signals.rsi14);
    let sma50_score =
        (signals.price_vs_sma50 * SMA50_MULTIPLIER).clamp(-SMA50_CAP, SMA50_CAP);
    let sma200_score =
        (signals.price_vs_sma200 * SMA200_MULTIPLIER).clamp(-SMA200_CAP, SMA200_CAP);
    let macd_score = (signals.macd.histogram * MACD_MULTIPLIER).clamp(-MACD_CAP, MACD_CAP);
    let rs_score = (signals.relative_strength_vs_benchmark * RELATIVE_STRENGTH_MULTIPLIER)
        .clamp(-RELATIVE_STRENGTH_CAP, RELATIVE_STRENGTH_CAP);

    let total = rsi_score + sma50_score + sma200_score + macd_score + rs_score;
    let score = total.clamp(-SCORE_CAP, SCORE_CAP).round() as i32;

    MomentumScore {
        symbol: signals.symbol.clone(),
        score,
        trend: classify_trend(score, signals.macd.histogram, signals.price_vs_sma50),
        signal: classify_signal(score),
    }
}

/// RSI band score. The momentum sweet spot is RSI 50-65; overbought readings
/// above 70 decay linearly toward the -25 floor, oversold readings below 30
/// decay from -15 toward the same floor.
fn rsi_component(rsi: f64) -> f64 {
    if (50.0..=65.0).contains(&rsi) {
        RSI_SWEET_SPOT_SCORE
    } else if rsi > 65.0 && rsi <= 70.0 {
        RSI_EXTENDED_SCORE
    } else if rsi > 70.0 {
        (RSI_SWEET_SPOT_SCORE - (rsi - 70.0) * RSI_OVERBOUGHT_DECAY).max(-RSI_CAP)
    } else if (40.0..50.0).contains(&rsi) {
        RSI_NEUTRAL_WEAK_SCORE
    } else if (30.0..40.0).contains(&rsi) {
        RSI_WEAK_SCORE
    } else {
        (RSI_OVERSOLD_BASE - (30.0 - rsi) * RSI_OVERSOLD_DECAY).max(-RSI_CAP)
    }
}

/// Trend depends on the score and two raw indicator values, not the score
/// alone: a high score with a negative histogram is not "accelerating".
fn classify_trend(score: i32, macd_histogram: f64, price_vs_sma50: f64) -> Trend {
    if score > 40 && macd_histogram > 0.0 && price_vs_sma50 > 0.0 {
        Trend::Accelerating
    } else if score > 0 && score <= 40 {
        Trend::Steady
    } else if score > -20 && score <= 0 {
        Trend::Decelerating
    } else {
        Trend::RollingOver
    }
}

fn classify_signal(score: i32) -> TradeSignal {
    if score >= 50 {
        TradeSignal::StrongBuy
    } else if score >= 20 {
        TradeSignal::Buy
    } else if score >= -10 {
        TradeSignal::Hold
    } else if score >= -40 {
        TradeSignal::Caution
    } else {
        TradeSignal::Sell
    }
}
