//! CSV file market-data adapter.
//!
//! Serves OHLCV history from a directory of per-symbol files
//! (`AAPL.csv` with `date,open,high,low,close,volume` rows) and quote
//! snapshots from an optional `quotes.csv` table. This is the offline
//! stand-in for a live market-data collaborator: the engine only ever sees
//! already-resolved data.

use crate::domain::error::FolioscanError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_port::{MarketDataPort, QuoteSnapshot};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvHistoryAdapter {
    history_dir: PathBuf,
    quotes_path: Option<PathBuf>,
}

impl CsvHistoryAdapter {
    pub fn new(history_dir: PathBuf, quotes_path: Option<PathBuf>) -> Self {
        Self {
            history_dir,
            quotes_path,
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FolioscanError> {
        let history_dir =
            config
                .get_string("data", "history_dir")
                .ok_or_else(|| FolioscanError::ConfigMissing {
                    section: "data".into(),
                    key: "history_dir".into(),
                })?;
        let quotes_path = config.get_string("data", "quotes_path").map(PathBuf::from);
        Ok(Self::new(PathBuf::from(history_dir), quotes_path))
    }

    fn history_path(&self, symbol: &str) -> PathBuf {
        self.history_dir.join(format!("{}.csv", symbol.to_uppercase()))
    }
}

impl MarketDataPort for CsvHistoryAdapter {
    fn fetch_history(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, FolioscanError> {
        let path = self.history_path(symbol);
        // A symbol with no file is simply unknown to this source.
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).map_err(|e| FolioscanError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| FolioscanError::Database {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date_str = record.get(0).ok_or_else(|| FolioscanError::Database {
                reason: format!("missing date column in {}", path.display()),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                FolioscanError::Database {
                    reason: format!("invalid date in {}: {}", path.display(), e),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let field = |idx: usize, name: &str| -> Result<f64, FolioscanError> {
                record
                    .get(idx)
                    .ok_or_else(|| FolioscanError::Database {
                        reason: format!("missing {} column in {}", name, path.display()),
                    })?
                    .parse()
                    .map_err(|e| FolioscanError::Database {
                        reason: format!("invalid {} value in {}: {}", name, path.display(), e),
                    })
            };

            let open = field(1, "open")?;
            let high = field(2, "high")?;
            let low = field(3, "low")?;
            let close = field(4, "close")?;
            let volume: i64 = record
                .get(5)
                .ok_or_else(|| FolioscanError::Database {
                    reason: format!("missing volume column in {}", path.display()),
                })?
                .parse()
                .map_err(|e| FolioscanError::Database {
                    reason: format!("invalid volume value in {}: {}", path.display(), e),
                })?;

            bars.push(OhlcvBar {
                symbol: symbol.to_uppercase(),
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn fetch_quote(&self, symbol: &str) -> Result<Option<QuoteSnapshot>, FolioscanError> {
        let Some(path) = &self.quotes_path else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|e| FolioscanError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let wanted = symbol.to_uppercase();

        for result in rdr.records() {
            let record = result.map_err(|e| FolioscanError::Database {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            let row_symbol = record.get(0).unwrap_or("").trim().to_uppercase();
            if row_symbol != wanted {
                continue;
            }
            let num = |idx: usize| -> f64 {
                record
                    .get(idx)
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(0.0)
            };
            return Ok(Some(QuoteSnapshot {
                symbol: row_symbol,
                price: num(1),
                day_change: num(2),
                day_change_percent: num(3),
                fifty_two_week_high: num(4),
                fifty_two_week_low: num(5),
                sector: record.get(6).unwrap_or("").trim().to_string(),
                industry: record.get(7).unwrap_or("").trim().to_string(),
            }));
        }

        Ok(None)
    }

    fn list_symbols(&self) -> Result<Vec<String>, FolioscanError> {
        let entries = fs::read_dir(&self.history_dir).map_err(|e| FolioscanError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.history_dir.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FolioscanError::Database {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".csv") {
                if !stem.eq_ignore_ascii_case("quotes") {
                    symbols.push(stem.to_uppercase());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
