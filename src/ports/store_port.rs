//! Persistence port traits for holdings and the analysis cache.

use crate::domain::analysis::{AnalysisCacheEntry, SymbolAnalysis};
use crate::domain::error::FolioscanError;
use crate::domain::holding::{Holding, HoldingUpdate};

/// Holdings persistence, keyed on (symbol, account_type).
///
/// An import replaces the whole position set (`replace_all`); targeted
/// writes go through [`HoldingUpdate`], whose `EnrichOnly` variant refreshes
/// quote-derived fields without touching quantity or cost basis.
pub trait HoldingsStore {
    fn replace_all(&self, holdings: &[Holding]) -> Result<(), FolioscanError>;
    fn apply(&self, update: &HoldingUpdate) -> Result<(), FolioscanError>;
    fn all(&self) -> Result<Vec<Holding>, FolioscanError>;
}

/// Analysis cache keyed by symbol: the latest (technicals, risk, momentum)
/// triple with its write timestamp, overwritten wholesale on every
/// recomputation. Presentation layers read it; only the analysis pipeline
/// writes it.
pub trait AnalysisCacheStore {
    /// Overwrite the symbol's entry with this triple; the store stamps
    /// `last_updated` at write time.
    fn put(&self, analysis: &SymbolAnalysis) -> Result<(), FolioscanError>;
    fn get(&self, symbol: &str) -> Result<Option<AnalysisCacheEntry>, FolioscanError>;
}
