//! Standard account-oriented statement dialect.
//!
//! These exports sometimes carry disclaimer banner lines above the real
//! header, group rows by account (the account cell is blank after the first
//! row of each group), and close with subtotal/footer rows that are not
//! positions.

use super::{clean_numeric, column};
use crate::domain::holding::{normalize_account_type, Holding};

pub(super) fn parse(content: &str) -> Vec<Holding> {
    // Scan past any banner lines to the real header.
    let lines: Vec<&str> = content.lines().collect();
    let header_idx = lines
        .iter()
        .position(|l| {
            let t = l.trim_start();
            t.starts_with("Account Name") || t.starts_with("\"Account Name")
        })
        .unwrap_or(0);
    let body = lines[header_idx..].join("\n");

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(body.as_bytes());

    let headers = match rdr.headers() {
        Ok(h) => h.clone(),
        Err(_) => return Vec::new(),
    };

    let idx_account =
        column(&headers, "Account Name/Number").or_else(|| column(&headers, "Account Name"));
    let idx_symbol = column(&headers, "Symbol");
    let idx_description = column(&headers, "Description");
    let idx_quantity = column(&headers, "Quantity");
    let idx_last_price = column(&headers, "Last Price");
    let idx_current_value = column(&headers, "Current Value");
    let idx_gain = column(&headers, "Total Gain/Loss Dollar");
    let idx_gain_pct = column(&headers, "Total Gain/Loss Percent");
    let idx_cost_per_share =
        column(&headers, "Cost Basis Per Share").or_else(|| column(&headers, "Average Cost Basis"));
    let idx_cost_total = column(&headers, "Cost Basis Total");

    let mut holdings = Vec::new();
    // Grouped exports state the account once; it applies to every following
    // row until the next non-empty account cell.
    let mut current_account = String::new();

    for record in rdr.records().flatten() {
        let get = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("").trim();

        let account_field = get(idx_account);
        if !account_field.is_empty() {
            current_account = account_field.to_string();
        }

        let symbol = get(idx_symbol);
        // Header echoes, subtotal/footer rows and pending activity are not positions.
        if symbol.is_empty() || symbol == "Symbol" {
            continue;
        }
        if symbol.contains("Pending") || symbol.contains("Total") {
            continue;
        }
        // Cash sweep tickers
        if symbol == "FCASH" || symbol.starts_with("SPAXX") {
            continue;
        }
        let quantity = clean_numeric(get(idx_quantity));
        if quantity <= 0.0 {
            continue;
        }

        let cost_per_share = clean_numeric(get(idx_cost_per_share));
        let cost_total = clean_numeric(get(idx_cost_total));
        let current_price = clean_numeric(get(idx_last_price));
        let reported_value = clean_numeric(get(idx_current_value));

        // Reconstruct whichever cost-basis view the export left blank.
        let cost_basis = if cost_per_share != 0.0 {
            cost_per_share
        } else {
            cost_total / quantity
        };
        let total_cost_basis = if cost_total != 0.0 {
            cost_total
        } else {
            cost_per_share * quantity
        };
        let market_value = if reported_value != 0.0 {
            reported_value
        } else {
            current_price * quantity
        };

        holdings.push(Holding {
            symbol: symbol.to_string(),
            description: get(idx_description).to_string(),
            quantity,
            cost_basis,
            total_cost_basis,
            current_price,
            market_value,
            gain_loss: clean_numeric(get(idx_gain)),
            gain_loss_percent: clean_numeric(get(idx_gain_pct)),
            sector: String::new(),
            industry: String::new(),
            account_type: normalize_account_type(&current_account),
            extended: None,
        });
    }

    holdings
}

#[cfg(test)]
mod tests {
    use crate::domain::statement::parse_holdings;

    const HEADER: &str = "Account Name/Number,Symbol,Description,Quantity,Last Price,\
Current Value,Total Gain/Loss Dollar,Total Gain/Loss Percent,\
Cost Basis Per Share,Cost Basis Total";

    #[test]
    fn banner_lines_are_skipped() {
        let csv = format!(
            "Positions as of close of business\n\nSome disclaimer text, with commas\n{HEADER}\n\
Roth IRA (1234),AAPL,APPLE INC,10,$150.00,\"$1,500.00\",$500.00,50%,$100.00,\"$1,000.00\"\n"
        );
        let holdings = parse_holdings(csv.as_bytes());
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].symbol, "AAPL");
        assert_eq!(holdings[0].quantity, 10.0);
        assert_eq!(holdings[0].market_value, 1500.0);
        assert_eq!(holdings[0].account_type, "Roth IRA");
    }

    #[test]
    fn blank_account_inherits_previous() {
        let csv = format!(
            "{HEADER}\n\
Individual Brokerage,AAPL,APPLE INC,10,150,1500,500,50,100,1000\n\
,MSFT,MICROSOFT CORP,5,400,2000,200,11,360,1800\n\
My Roth IRA,NVDA,NVIDIA CORP,2,700,1400,400,40,500,1000\n"
        );
        let holdings = parse_holdings(csv.as_bytes());
        assert_eq!(holdings.len(), 3);
        assert_eq!(holdings[0].account_type, "Individual");
        assert_eq!(holdings[1].account_type, "Individual");
        assert_eq!(holdings[2].account_type, "Roth IRA");
    }

    #[test]
    fn footer_pending_and_cash_rows_dropped() {
        let csv = format!(
            "{HEADER}\n\
Brokerage,AAPL,APPLE INC,10,150,1500,500,50,100,1000\n\
,SPAXX**,FIDELITY GOVERNMENT MONEY MARKET,100,1,100,0,0,1,100\n\
,FCASH,CASH,50,1,50,0,0,1,50\n\
,Pending Activity,,,,,,,,\n\
,Total,,,,,,,,\n"
        );
        let holdings = parse_holdings(csv.as_bytes());
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].symbol, "AAPL");
    }

    #[test]
    fn zero_quantity_rows_dropped() {
        let csv = format!(
            "{HEADER}\n\
Brokerage,AAPL,APPLE INC,0,150,0,0,0,100,0\n\
Brokerage,MSFT,MICROSOFT CORP,\"1,250.5\",400,500200,0,0,360,450180\n"
        );
        let holdings = parse_holdings(csv.as_bytes());
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].symbol, "MSFT");
        assert_eq!(holdings[0].quantity, 1250.5);
    }

    #[test]
    fn missing_totals_reconstructed() {
        // No Cost Basis Total, no Current Value: both derived.
        let csv = format!(
            "{HEADER}\n\
Brokerage,AAPL,APPLE INC,10,150,,,,100,\n"
        );
        let holdings = parse_holdings(csv.as_bytes());
        assert_eq!(holdings.len(), 1);
        let h = &holdings[0];
        assert_eq!(h.total_cost_basis, 1000.0);
        assert_eq!(h.market_value, 1500.0);
        assert_eq!(h.cost_basis, 100.0);
    }

    #[test]
    fn missing_per_share_cost_reconstructed() {
        let csv = format!(
            "{HEADER}\n\
Brokerage,AAPL,APPLE INC,10,150,1500,500,50,,1000\n"
        );
        let holdings = parse_holdings(csv.as_bytes());
        assert_eq!(holdings[0].cost_basis, 100.0);
        assert_eq!(holdings[0].total_cost_basis, 1000.0);
    }

    #[test]
    fn parenthesized_losses_are_negative() {
        let csv = format!(
            "{HEADER}\n\
Brokerage,INTC,INTEL CORP,20,30,600,($123.45),(17.1%),36,720\n"
        );
        let holdings = parse_holdings(csv.as_bytes());
        assert_eq!(holdings[0].gain_loss, -123.45);
        assert_eq!(holdings[0].gain_loss_percent, -17.1);
    }

    #[test]
    fn empty_statement_yields_empty_list() {
        let holdings = parse_holdings(format!("{HEADER}\n").as_bytes());
        assert!(holdings.is_empty());
        let holdings = parse_holdings(b"");
        assert!(holdings.is_empty());
    }
}
