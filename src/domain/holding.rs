//! Holding records and account-type normalization.

use serde::{Deserialize, Serialize};

/// One position as parsed from a brokerage statement, later enriched with
/// live quote data. The natural key is (symbol, account_type): the same
/// ticker can be held in several accounts.
///
/// Invariants maintained by the parser and the enrich path:
/// `market_value ≈ current_price × quantity` unless the source reported the
/// value directly, and `gain_loss = market_value − total_cost_basis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: String,
    pub description: String,
    /// Always > 0 for parsed holdings; zero/negative rows are dropped.
    pub quantity: f64,
    pub cost_basis: f64,
    pub total_cost_basis: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percent: f64,
    pub sector: String,
    pub industry: String,
    pub account_type: String,

    /// Dividend/tax attributes only the extended statement dialect carries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended: Option<ExtendedAttrs>,
}

/// Optional attributes from the extended (dividend/tax-rich) export dialect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedAttrs {
    pub country: String,
    pub currency: String,
    pub pe_ratio: f64,
    pub eps: f64,
    pub beta: f64,
    pub expense_ratio: f64,
    pub dividend_yield: f64,
    pub dividend_yield_on_cost: f64,
    pub dividends_per_share: f64,
    pub dividends_received: f64,
    pub dividend_growth_5y: f64,
    pub next_payment_date: String,
    pub next_payment_amount: f64,
    pub ex_dividend_date: String,
    pub daily_change_dollar: f64,
    pub daily_change_percent: f64,
    pub irr: f64,
    pub realized_pnl: f64,
    pub total_profit: f64,
    pub total_profit_percent: f64,
    pub tax: f64,
    pub portfolio_share_percent: f64,
    pub target_share_percent: f64,
    pub category: String,
    pub isin: String,
    pub asset_type: String,
}

/// A write against the holdings store.
///
/// `Full` upserts the complete record keyed on (symbol, account_type).
/// `EnrichOnly` carries freshly resolved quote data and touches only
/// price/sector/industry (plus the derived market value and gain/loss);
/// quantity and cost basis are never altered, and no row is ever inserted.
#[derive(Debug, Clone)]
pub enum HoldingUpdate {
    Full(Holding),
    EnrichOnly {
        symbol: String,
        current_price: f64,
        sector: String,
        industry: String,
    },
}

/// Normalize a raw account label to one of the canonical account types.
/// Case-insensitive substring match, first hit in priority order wins;
/// unrecognized non-empty labels pass through trimmed.
pub fn normalize_account_type(raw: &str) -> String {
    let lower = raw.to_lowercase();
    if lower.contains("roth ira") {
        return "Roth IRA".into();
    }
    if lower.contains("traditional ira") || lower.contains("rollover") {
        return "Traditional IRA".into();
    }
    if lower.contains("401k") || lower.contains("401(k)") {
        return "401(k)".into();
    }
    if lower.contains("individual") || lower.contains("brokerage") {
        return "Individual".into();
    }
    if lower.contains("hsa") {
        return "HSA".into();
    }
    if lower.contains("529") {
        return "529".into();
    }
    if lower.contains("tiaa") || lower.contains("combined") {
        return "TIAA".into();
    }
    if lower.contains("ira") {
        return "IRA".into();
    }
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    "Unknown".into()
}
