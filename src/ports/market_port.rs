//! Market data access port trait.
//!
//! The analytics core never fetches anything itself; it consumes OHLCV
//! histories and quote snapshots that a collaborator behind this trait has
//! already resolved. A failure for one symbol must be surfaced as that
//! symbol's error only — batch callers warn and continue.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::error::FolioscanError;
use crate::domain::ohlcv::OhlcvBar;

/// Resolved quote snapshot for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub price: f64,
    pub day_change: f64,
    pub day_change_percent: f64,
    pub fifty_two_week_high: f64,
    pub fifty_two_week_low: f64,
    pub sector: String,
    pub industry: String,
}

pub trait MarketDataPort {
    /// OHLCV history for the symbol within the date window, ascending order
    /// not guaranteed. An unknown symbol is `Ok(vec![])`, not an error.
    fn fetch_history(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, FolioscanError>;

    /// Latest resolved quote, `None` when the source has nothing for the
    /// symbol.
    fn fetch_quote(&self, symbol: &str) -> Result<Option<QuoteSnapshot>, FolioscanError>;

    /// Symbols the source can supply history for.
    fn list_symbols(&self) -> Result<Vec<String>, FolioscanError>;
}
