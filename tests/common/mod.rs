#![allow(dead_code)]

use chrono::NaiveDate;
use folioscan::domain::error::FolioscanError;
use folioscan::domain::holding::Holding;
pub use folioscan::domain::ohlcv::OhlcvBar;
use folioscan::ports::market_port::{MarketDataPort, QuoteSnapshot};
use std::collections::HashMap;

pub struct MockMarketDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub quotes: HashMap<String, QuoteSnapshot>,
    pub errors: HashMap<String, String>,
}

impl MockMarketDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            quotes: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_quote(mut self, quote: QuoteSnapshot) -> Self {
        self.quotes.insert(quote.symbol.clone(), quote);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockMarketDataPort {
    fn fetch_history(
        &self,
        symbol: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, FolioscanError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(FolioscanError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn fetch_quote(&self, symbol: &str) -> Result<Option<QuoteSnapshot>, FolioscanError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(FolioscanError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self.quotes.get(symbol).cloned())
    }

    fn list_symbols(&self) -> Result<Vec<String>, FolioscanError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date_str: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        symbol: symbol.to_string(),
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

pub fn generate_bars(symbol: &str, start_date: &str, count: usize, start_price: f64) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| OhlcvBar {
            symbol: symbol.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: start_price + i as f64,
            high: start_price + i as f64 + 1.0,
            low: start_price + i as f64 - 1.0,
            close: start_price + i as f64,
            volume: 1000,
        })
        .collect()
}

pub fn make_holding(symbol: &str, account_type: &str, quantity: f64, price: f64) -> Holding {
    Holding {
        symbol: symbol.to_string(),
        description: format!("{} test position", symbol),
        quantity,
        cost_basis: price * 0.8,
        total_cost_basis: price * 0.8 * quantity,
        current_price: price,
        market_value: price * quantity,
        gain_loss: price * 0.2 * quantity,
        gain_loss_percent: 25.0,
        sector: "Technology".into(),
        industry: String::new(),
        account_type: account_type.to_string(),
        extended: None,
    }
}
