//! Per-holding risk metrics: volatility-trailed stop, concentration weights,
//! composite risk level and the long-term capital-gains countdown.
//!
//! The point thresholds below are a fixed heuristic policy, not a fitted
//! model. Leave them alone without product sign-off.

use std::collections::HashMap;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::holding::Holding;
use crate::domain::ohlcv::{sort_ascending, OhlcvBar};
use crate::domain::technicals::TechnicalSignals;

/// Trailing stop trails the recent high by this many ATRs.
const ATR_STOP_MULTIPLIER: f64 = 2.0;
/// Bars considered when finding the recent high.
const RECENT_HIGH_WINDOW: usize = 20;
/// Flat stop distance used when ATR is unknown (reported as 0).
const FALLBACK_STOP_FRACTION: f64 = 0.9;
const FALLBACK_STOP_PERCENT: f64 = 10.0;

/// Risk point table.
const CONCENTRATION_HIGH_PCT: f64 = 20.0;
const CONCENTRATION_HIGH_POINTS: u32 = 3;
const CONCENTRATION_ELEVATED_PCT: f64 = 10.0;
const CONCENTRATION_ELEVATED_POINTS: u32 = 1;
const STOP_PROXIMITY_TIGHT_PCT: f64 = 3.0;
const STOP_PROXIMITY_TIGHT_POINTS: u32 = 2;
const STOP_PROXIMITY_CLOSE_PCT: f64 = 5.0;
const STOP_PROXIMITY_CLOSE_POINTS: u32 = 1;
const VOLATILITY_HIGH_FRACTION: f64 = 0.03;
const VOLATILITY_HIGH_POINTS: u32 = 2;
const VOLATILITY_ELEVATED_FRACTION: f64 = 0.02;
const VOLATILITY_ELEVATED_POINTS: u32 = 1;
const RISK_HIGH_THRESHOLD: u32 = 4;
const RISK_MEDIUM_THRESHOLD: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        write!(f, "{}", label)
    }
}

/// Point-in-time risk snapshot. Weights capture the portfolio at the moment
/// of computation, not a running average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub symbol: String,
    pub trailing_stop_price: f64,
    pub trailing_stop_percent: f64,
    pub portfolio_weight: f64,
    pub sector_weight: f64,
    pub risk_level: RiskLevel,
    /// Days until the one-year long-term capital-gains boundary; `None` when
    /// no purchase date is known or the boundary has already passed.
    pub days_until_long_term: Option<i64>,
    pub next_earnings_date: Option<NaiveDate>,
}

/// Inputs for one holding. `as_of` anchors the tax countdown so the
/// computation stays a pure function of its arguments.
#[derive(Debug, Clone)]
pub struct RiskInput<'a> {
    pub symbol: &'a str,
    pub current_price: f64,
    pub market_value: f64,
    pub total_portfolio_value: f64,
    pub sector_value: f64,
    pub total_sector_value: f64,
    pub atr14: f64,
    pub recent_history: &'a [OhlcvBar],
    pub purchase_date: Option<NaiveDate>,
    pub next_earnings_date: Option<NaiveDate>,
    pub as_of: NaiveDate,
}

/// Compute risk metrics for one holding. Callable per symbol: nothing here
/// depends on other holdings beyond the aggregate totals passed in.
pub fn compute_risk_metrics(input: &RiskInput) -> RiskMetrics {
    let sorted = sort_ascending(input.recent_history);
    let recent_high = sorted
        .iter()
        .rev()
        .take(RECENT_HIGH_WINDOW)
        .map(|b| b.high)
        .fold(input.current_price, f64::max);

    // ATR 0 means "volatility unknown" (short history); a flat 10% stop
    // replaces the ATR trail rather than collapsing the stop to the high.
    let trailing_stop_price = if input.atr14 > 0.0 {
        (recent_high - ATR_STOP_MULTIPLIER * input.atr14).max(0.0)
    } else {
        input.current_price * FALLBACK_STOP_FRACTION
    };

    let trailing_stop_percent = if input.current_price > 0.0 {
        (input.current_price - trailing_stop_price) / input.current_price * 100.0
    } else {
        FALLBACK_STOP_PERCENT
    };

    let portfolio_weight = if input.total_portfolio_value > 0.0 {
        input.market_value / input.total_portfolio_value * 100.0
    } else {
        0.0
    };

    let sector_weight = if input.total_sector_value > 0.0 {
        input.sector_value / input.total_sector_value * 100.0
    } else {
        0.0
    };

    let mut points: u32 = 0;
    if portfolio_weight > CONCENTRATION_HIGH_PCT {
        points += CONCENTRATION_HIGH_POINTS;
    } else if portfolio_weight > CONCENTRATION_ELEVATED_PCT {
        points += CONCENTRATION_ELEVATED_POINTS;
    }
    if trailing_stop_percent < STOP_PROXIMITY_TIGHT_PCT {
        points += STOP_PROXIMITY_TIGHT_POINTS;
    } else if trailing_stop_percent < STOP_PROXIMITY_CLOSE_PCT {
        points += STOP_PROXIMITY_CLOSE_POINTS;
    }
    if input.atr14 > input.current_price * VOLATILITY_HIGH_FRACTION {
        points += VOLATILITY_HIGH_POINTS;
    } else if input.atr14 > input.current_price * VOLATILITY_ELEVATED_FRACTION {
        points += VOLATILITY_ELEVATED_POINTS;
    }

    let risk_level = if points >= RISK_HIGH_THRESHOLD {
        RiskLevel::High
    } else if points >= RISK_MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let days_until_long_term = input.purchase_date.and_then(|purchase| {
        let long_term_date = purchase
            .checked_add_months(Months::new(12))
            .unwrap_or(purchase);
        let days = (long_term_date - input.as_of).num_days();
        if days > 0 { Some(days) } else { None }
    });

    RiskMetrics {
        symbol: input.symbol.to_string(),
        trailing_stop_price,
        trailing_stop_percent,
        portfolio_weight,
        sector_weight,
        risk_level,
        days_until_long_term,
        next_earnings_date: input.next_earnings_date,
    }
}

/// Portfolio sweep: aggregate totals once, then compute each holding
/// independently. Sector totals key on the holding's sector or `Unknown`.
pub fn compute_all_risk_metrics(
    holdings: &[Holding],
    technicals: &HashMap<String, TechnicalSignals>,
    history: &HashMap<String, Vec<OhlcvBar>>,
    as_of: NaiveDate,
) -> HashMap<String, RiskMetrics> {
    let total_portfolio_value: f64 = holdings.iter().map(|h| h.market_value).sum();
    let sector_totals = sector_totals(holdings);

    let mut results = HashMap::new();
    for h in holdings {
        let sector = sector_key(&h.sector);
        let atr14 = technicals.get(&h.symbol).map(|t| t.atr14).unwrap_or(0.0);
        let empty: Vec<OhlcvBar> = Vec::new();
        let bars = history.get(&h.symbol).unwrap_or(&empty);

        let metrics = compute_risk_metrics(&RiskInput {
            symbol: &h.symbol,
            current_price: h.current_price,
            market_value: h.market_value,
            total_portfolio_value,
            sector_value: h.market_value,
            total_sector_value: sector_totals
                .get(sector)
                .copied()
                .unwrap_or(h.market_value),
            atr14,
            recent_history: bars,
            purchase_date: None,
            next_earnings_date: None,
            as_of,
        });
        results.insert(h.symbol.clone(), metrics);
    }

    results
}

/// Market value per sector, holdings without a sector pooled under `Unknown`.
pub fn sector_totals(holdings: &[Holding]) -> HashMap<&str, f64> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for h in holdings {
        *totals.entry(sector_key(&h.sector)).or_insert(0.0) += h.market_value;
    }
    totals
}

fn sector_key(sector: &str) -> &str {
    if sector.is_empty() { "Unknown" } else { sector }
}
