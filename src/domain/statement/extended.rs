//! Extended dividend/tax-rich statement dialect.
//!
//! The header is the first line. Capital gain, total profit and daily change
//! are exported twice under the same column name: dollar amount first,
//! percent second. Those pairs are resolved by ordinal column position.

use super::{clean_numeric, column, column_occurrence};
use crate::domain::holding::{normalize_account_type, ExtendedAttrs, Holding};

/// Fund-house brand tokens that mark an expense-ratio-bearing holding as an
/// ETF rather than a mutual fund.
const FUND_BRAND_TOKENS: [&str; 5] = ["etf", "ishares", "vanguard", "spdr", "invesco"];

pub(super) fn parse(content: &str) -> Vec<Holding> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = match rdr.headers() {
        Ok(h) => h.clone(),
        Err(_) => return Vec::new(),
    };

    let idx_symbol = column(&headers, "Holding");
    let idx_name = column(&headers, "Holdings' name");
    let idx_shares = column(&headers, "Shares");
    let idx_currency = column(&headers, "Currency");
    let idx_cost_basis = column(&headers, "Cost basis");
    let idx_current_value = column(&headers, "Current value");
    let idx_share_price = column(&headers, "Share price");
    let idx_country = column(&headers, "Country");
    let idx_sector = column(&headers, "Sector");
    let idx_portfolios = column(&headers, "Portfolios");
    let idx_pe = column(&headers, "PE");
    let idx_eps = column(&headers, "EPS");
    let idx_beta = column(&headers, "Beta");
    let idx_expense_ratio = column(&headers, "Expense ratio");
    let idx_dividend_yield = column(&headers, "Dividend yield");
    let idx_yield_on_cost = column(&headers, "Dividend yield on cost");
    let idx_dividends_per_share = column(&headers, "Dividends per share");
    let idx_dividends_received = column(&headers, "Dividends received");
    let idx_dividend_growth = column(&headers, "Dividend growth (5Y)");
    let idx_next_payment_date = column(&headers, "Next payment date");
    let idx_next_payment_amount = column(&headers, "Next payment amount");
    let idx_ex_dividend_date = column(&headers, "Ex-dividend date");
    let idx_irr = column(&headers, "IRR");
    let idx_realized_pnl = column(&headers, "Realized P&L");
    let idx_tax = column(&headers, "Tax");
    let idx_holding_share = column(&headers, "Holding's share");
    let idx_target_share = column(&headers, "Target share");
    let idx_category = column(&headers, "Category");
    let idx_isin = column(&headers, "ISIN");

    // Dollar-then-percent pairs under one repeated header name.
    let idx_capital_gain = column_occurrence(&headers, "Capital gain", 0);
    let idx_capital_gain_pct = column_occurrence(&headers, "Capital gain", 1);
    let idx_total_profit = column_occurrence(&headers, "Total profit", 0);
    let idx_total_profit_pct = column_occurrence(&headers, "Total profit", 1);
    let idx_daily_change = column_occurrence(&headers, "Daily change", 0);
    let idx_daily_change_pct = column_occurrence(&headers, "Daily change", 1);

    let mut holdings = Vec::new();

    for record in rdr.records().flatten() {
        let get = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("").trim();

        let symbol = get(idx_symbol);
        if symbol.is_empty() {
            continue;
        }
        let quantity = clean_numeric(get(idx_shares));
        if quantity <= 0.0 {
            continue;
        }

        let name = get(idx_name).to_string();
        let sector = get(idx_sector).to_string();
        let current_price = clean_numeric(get(idx_share_price));
        let reported_value = clean_numeric(get(idx_current_value));
        let total_cost = clean_numeric(get(idx_cost_basis));
        let cost_basis = total_cost / quantity;
        let expense_ratio = clean_numeric(get(idx_expense_ratio));

        let total_profit = clean_numeric(get(idx_total_profit));
        let total_profit_percent = clean_numeric(get(idx_total_profit_pct));

        let extended = ExtendedAttrs {
            country: get(idx_country).to_string(),
            currency: get(idx_currency).to_string(),
            pe_ratio: clean_numeric(get(idx_pe)),
            eps: clean_numeric(get(idx_eps)),
            beta: clean_numeric(get(idx_beta)),
            expense_ratio,
            dividend_yield: clean_numeric(get(idx_dividend_yield)),
            dividend_yield_on_cost: clean_numeric(get(idx_yield_on_cost)),
            dividends_per_share: clean_numeric(get(idx_dividends_per_share)),
            dividends_received: clean_numeric(get(idx_dividends_received)),
            dividend_growth_5y: clean_numeric(get(idx_dividend_growth)),
            next_payment_date: get(idx_next_payment_date).to_string(),
            next_payment_amount: clean_numeric(get(idx_next_payment_amount)),
            ex_dividend_date: get(idx_ex_dividend_date).to_string(),
            daily_change_dollar: clean_numeric(get(idx_daily_change)),
            daily_change_percent: clean_numeric(get(idx_daily_change_pct)),
            irr: clean_numeric(get(idx_irr)),
            realized_pnl: clean_numeric(get(idx_realized_pnl)),
            total_profit,
            total_profit_percent,
            tax: clean_numeric(get(idx_tax)),
            portfolio_share_percent: clean_numeric(get(idx_holding_share)),
            target_share_percent: clean_numeric(get(idx_target_share)),
            category: get(idx_category).to_string(),
            isin: get(idx_isin).to_string(),
            asset_type: detect_asset_type(expense_ratio, &sector, &name),
        };

        holdings.push(Holding {
            symbol: symbol.to_string(),
            description: name,
            quantity,
            cost_basis,
            total_cost_basis: if total_cost != 0.0 {
                total_cost
            } else {
                cost_basis * quantity
            },
            current_price,
            market_value: if reported_value != 0.0 {
                reported_value
            } else {
                current_price * quantity
            },
            gain_loss: clean_numeric(get(idx_capital_gain)),
            gain_loss_percent: clean_numeric(get(idx_capital_gain_pct)),
            sector,
            industry: String::new(),
            account_type: normalize_account_type(get(idx_portfolios)),
            extended: Some(extended),
        });
    }

    holdings
}

/// Classify the asset from the attributes this dialect exposes: an expense
/// ratio marks a fund (ETF when the name carries a fund-house brand token),
/// a sector marks a stock, and index-product names mark an ETF.
fn detect_asset_type(expense_ratio: f64, sector: &str, name: &str) -> String {
    let name = name.to_lowercase();
    let sector = sector.trim().to_lowercase();

    if expense_ratio > 0.0 {
        if FUND_BRAND_TOKENS.iter().any(|t| name.contains(t)) {
            return "ETF".into();
        }
        return "Mutual Fund".into();
    }
    if !sector.is_empty() && sector != "n/a" {
        return "Stock".into();
    }
    if name.contains("etf") || name.contains("index") {
        return "ETF".into();
    }
    "Stock".into()
}
