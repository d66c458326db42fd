//! Portfolio analysis assembly.
//!
//! Pure sweep over already-fetched data: holdings plus per-symbol histories
//! in, the (technicals, risk, momentum) triple per analyzable symbol out.
//! Fetching and cache writes belong to the orchestrating caller.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::holding::Holding;
use crate::domain::momentum::{compute_momentum, MomentumScore};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::risk::{compute_risk_metrics, sector_totals, RiskInput, RiskMetrics};
use crate::domain::technicals::{compute_technicals, TechnicalSignals};

/// One symbol's complete analysis triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolAnalysis {
    pub symbol: String,
    pub technicals: TechnicalSignals,
    pub risk: RiskMetrics,
    pub momentum: MomentumScore,
}

/// The cached tuple as stored per symbol. `last_updated` is stamped by the
/// store at write time; the domain never reads the clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisCacheEntry {
    pub symbol: String,
    pub technicals: TechnicalSignals,
    pub risk: RiskMetrics,
    pub momentum: MomentumScore,
    pub last_updated: NaiveDateTime,
}

/// Result of an analysis sweep. Symbols without usable history are listed in
/// `insufficient` so callers can report them instead of silently dropping
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioAnalysis {
    pub analyses: Vec<SymbolAnalysis>,
    pub insufficient: Vec<String>,
}

/// Analyze every unique symbol in the portfolio.
///
/// Aggregates (total portfolio value, sector totals) are computed once over
/// all holdings; the first holding per symbol supplies the per-symbol risk
/// inputs. A symbol with an empty or missing history is reported in
/// `insufficient`, never analyzed with made-up data.
pub fn analyze_portfolio(
    holdings: &[Holding],
    history: &HashMap<String, Vec<OhlcvBar>>,
    benchmark: Option<&[OhlcvBar]>,
    as_of: NaiveDate,
) -> PortfolioAnalysis {
    let total_portfolio_value: f64 = holdings.iter().map(|h| h.market_value).sum();
    let totals = sector_totals(holdings);

    let mut analyses = Vec::new();
    let mut insufficient = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for h in holdings {
        if !seen.insert(h.symbol.as_str()) {
            continue;
        }

        let bars = match history.get(&h.symbol) {
            Some(b) if !b.is_empty() => b,
            _ => {
                insufficient.push(h.symbol.clone());
                continue;
            }
        };

        let technicals = compute_technicals(&h.symbol, bars, benchmark);
        let sector = if h.sector.is_empty() {
            "Unknown"
        } else {
            &h.sector
        };
        let risk = compute_risk_metrics(&RiskInput {
            symbol: &h.symbol,
            current_price: h.current_price,
            market_value: h.market_value,
            total_portfolio_value,
            sector_value: h.market_value,
            total_sector_value: totals.get(sector).copied().unwrap_or(h.market_value),
            atr14: technicals.atr14,
            recent_history: bars,
            purchase_date: None,
            next_earnings_date: None,
            as_of,
        });
        let momentum = compute_momentum(&technicals);

        analyses.push(SymbolAnalysis {
            symbol: h.symbol.clone(),
            technicals,
            risk,
            momentum,
        });
    }

    PortfolioAnalysis {
        analyses,
        insufficient,
    }
}
