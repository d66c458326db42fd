//! Brokerage statement parsing.
//!
//! Two export dialects are supported and auto-detected from the header line,
//! never from a file name or caller flag:
//!
//! - **standard**: account-oriented export with optional disclaimer banner
//!   lines above the header and account labels carried down grouped rows.
//! - **extended**: dividend/tax-rich export whose header is the first line
//!   and which repeats certain column names (dollar amount first, percent
//!   second).
//!
//! Parsing never performs I/O and never fails: malformed numeric cells
//! degrade to zero and structurally invalid rows are skipped. An empty
//! result is the caller's condition to report.

mod standard;
mod extended;

use crate::domain::holding::Holding;

/// Column markers that identify the extended dialect's header line.
const EXTENDED_MARKERS: [&str; 3] = ["Holding", "Holdings' name", "Share price"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Standard,
    Extended,
}

fn detect_dialect(content: &str) -> Dialect {
    let first_line = content.lines().next().unwrap_or("");
    if EXTENDED_MARKERS.iter().all(|m| first_line.contains(m)) {
        Dialect::Extended
    } else {
        Dialect::Standard
    }
}

/// Parse raw statement bytes into holdings.
///
/// Every returned holding has a non-empty symbol and quantity > 0.
pub fn parse_holdings(bytes: &[u8]) -> Vec<Holding> {
    let text = String::from_utf8_lossy(bytes);
    // Excel and several export tools prepend a BOM; strip before detection.
    let content = text.strip_prefix('\u{feff}').unwrap_or(&text);

    match detect_dialect(content) {
        Dialect::Extended => extended::parse(content),
        Dialect::Standard => standard::parse(content),
    }
}

/// Parse a numeric statement cell: strips currency symbols, thousands
/// separators, percent signs and whitespace, and reads accounting-style
/// parentheses as negative (`($12.34)` → -12.34). Malformed input is 0.0.
pub(crate) fn clean_numeric(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let negative = trimmed.starts_with('(') && trimmed.ends_with(')');
    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        .collect();
    let value: f64 = cleaned.parse().unwrap_or(0.0);
    if negative { -value.abs() } else { value }
}

/// Index of the nth column with the given (trimmed) header name.
/// Duplicate headers are disambiguated by ordinal position.
pub(crate) fn column_occurrence(
    headers: &csv::StringRecord,
    name: &str,
    occurrence: usize,
) -> Option<usize> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.trim() == name)
        .map(|(i, _)| i)
        .nth(occurrence)
}

/// First column with the given header name.
pub(crate) fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    column_occurrence(headers, name, 0)
}
