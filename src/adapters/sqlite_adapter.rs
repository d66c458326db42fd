//! SQLite storage adapter: holdings, the OHLCV bar cache and the per-symbol
//! analysis cache live in one pooled database.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::domain::analysis::{AnalysisCacheEntry, SymbolAnalysis};
use crate::domain::error::FolioscanError;
use crate::domain::holding::{Holding, HoldingUpdate};
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_port::{MarketDataPort, QuoteSnapshot};
use crate::ports::store_port::{AnalysisCacheStore, HoldingsStore};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FolioscanError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| FolioscanError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| FolioscanError::Database {
                    reason: e.to_string(),
                })?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, FolioscanError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| FolioscanError::Database {
                reason: e.to_string(),
            })?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    fn conn(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, FolioscanError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| FolioscanError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), FolioscanError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS holdings (
                symbol TEXT NOT NULL,
                account_type TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                quantity REAL NOT NULL,
                cost_basis REAL NOT NULL DEFAULT 0,
                total_cost_basis REAL NOT NULL DEFAULT 0,
                current_price REAL NOT NULL DEFAULT 0,
                market_value REAL NOT NULL DEFAULT 0,
                gain_loss REAL NOT NULL DEFAULT 0,
                gain_loss_percent REAL NOT NULL DEFAULT 0,
                sector TEXT NOT NULL DEFAULT '',
                industry TEXT NOT NULL DEFAULT '',
                last_updated TEXT,
                PRIMARY KEY (symbol, account_type)
            );
            CREATE TABLE IF NOT EXISTS ohlcv (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (symbol, date)
            );
            CREATE INDEX IF NOT EXISTS idx_ohlcv_symbol ON ohlcv(symbol);
            CREATE TABLE IF NOT EXISTS analysis_cache (
                symbol TEXT PRIMARY KEY,
                technical_signals TEXT NOT NULL,
                risk_metrics TEXT NOT NULL,
                momentum_score TEXT NOT NULL,
                last_updated TEXT NOT NULL
            );",
        )
        .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Upsert a batch of bars into the OHLCV cache.
    pub fn insert_bars(&self, bars: &[OhlcvBar]) -> Result<(), FolioscanError> {
        let mut conn = self.conn()?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO ohlcv (symbol, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    bar.symbol,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    fn now() -> String {
        Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string()
    }
}

impl MarketDataPort for SqliteAdapter {
    fn fetch_history(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, FolioscanError> {
        let conn = self.conn()?;

        let start_str = start_date.format("%Y-%m-%d").to_string();
        let end_str = end_date.format("%Y-%m-%d").to_string();

        let query = "SELECT symbol, date, open, high, low, close, volume
                     FROM ohlcv
                     WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
                     ORDER BY date ASC";

        let mut stmt =
            conn.prepare(query)
                .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params![symbol, start_str, end_str], |row| {
                let date_str: String = row.get(1)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        date_str.len(),
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(OhlcvBar {
                    symbol: row.get(0)?,
                    date,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    volume: row.get(6)?,
                })
            })
            .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(
                row.map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }
        Ok(bars)
    }

    fn fetch_quote(&self, _symbol: &str) -> Result<Option<QuoteSnapshot>, FolioscanError> {
        // The bar cache is not a quote source.
        Ok(None)
    }

    fn list_symbols(&self) -> Result<Vec<String>, FolioscanError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM ohlcv ORDER BY symbol")
            .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(
                row.map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }
        Ok(symbols)
    }
}

impl HoldingsStore for SqliteAdapter {
    fn replace_all(&self, holdings: &[Holding]) -> Result<(), FolioscanError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        tx.execute("DELETE FROM holdings", [])
            .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let now = Self::now();
        for h in holdings {
            tx.execute(
                "INSERT OR REPLACE INTO holdings
                 (symbol, account_type, description, quantity, cost_basis, total_cost_basis,
                  current_price, market_value, gain_loss, gain_loss_percent, sector, industry,
                  last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    h.symbol,
                    h.account_type,
                    h.description,
                    h.quantity,
                    h.cost_basis,
                    h.total_cost_basis,
                    h.current_price,
                    h.market_value,
                    h.gain_loss,
                    h.gain_loss_percent,
                    h.sector,
                    h.industry,
                    now,
                ],
            )
            .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })
    }

    fn apply(&self, update: &HoldingUpdate) -> Result<(), FolioscanError> {
        let conn = self.conn()?;

        match update {
            HoldingUpdate::Full(h) => {
                conn.execute(
                    "INSERT OR REPLACE INTO holdings
                     (symbol, account_type, description, quantity, cost_basis, total_cost_basis,
                      current_price, market_value, gain_loss, gain_loss_percent, sector, industry,
                      last_updated)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    params![
                        h.symbol,
                        h.account_type,
                        h.description,
                        h.quantity,
                        h.cost_basis,
                        h.total_cost_basis,
                        h.current_price,
                        h.market_value,
                        h.gain_loss,
                        h.gain_loss_percent,
                        h.sector,
                        h.industry,
                        Self::now(),
                    ],
                )
                .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                    reason: e.to_string(),
                })?;
            }
            HoldingUpdate::EnrichOnly {
                symbol,
                current_price,
                sector,
                industry,
            } => {
                // Every account row for the symbol picks up the quote data.
                // Market value and gain/loss follow from the new price so the
                // price × quantity invariant holds; quantity and cost basis
                // are never touched, and no row is inserted.
                conn.execute(
                    "UPDATE holdings SET
                        current_price = ?1,
                        sector = CASE WHEN ?2 != '' THEN ?2 ELSE sector END,
                        industry = CASE WHEN ?3 != '' THEN ?3 ELSE industry END,
                        market_value = ?1 * quantity,
                        gain_loss = ?1 * quantity - total_cost_basis,
                        last_updated = ?4
                     WHERE symbol = ?5",
                    params![current_price, sector, industry, Self::now(), symbol],
                )
                .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                    reason: e.to_string(),
                })?;
            }
        }

        Ok(())
    }

    fn all(&self) -> Result<Vec<Holding>, FolioscanError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT symbol, account_type, description, quantity, cost_basis,
                        total_cost_basis, current_price, market_value, gain_loss,
                        gain_loss_percent, sector, industry
                 FROM holdings ORDER BY market_value DESC",
            )
            .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Holding {
                    symbol: row.get(0)?,
                    account_type: row.get(1)?,
                    description: row.get(2)?,
                    quantity: row.get(3)?,
                    cost_basis: row.get(4)?,
                    total_cost_basis: row.get(5)?,
                    current_price: row.get(6)?,
                    market_value: row.get(7)?,
                    gain_loss: row.get(8)?,
                    gain_loss_percent: row.get(9)?,
                    sector: row.get(10)?,
                    industry: row.get(11)?,
                    extended: None,
                })
            })
            .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut holdings = Vec::new();
        for row in rows {
            holdings.push(
                row.map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }
        Ok(holdings)
    }
}

impl AnalysisCacheStore for SqliteAdapter {
    fn put(&self, analysis: &SymbolAnalysis) -> Result<(), FolioscanError> {
        let conn = self.conn()?;

        let technicals = serde_json::to_string(&analysis.technicals).map_err(|e| {
            FolioscanError::DatabaseQuery {
                reason: format!("cache serialization failed: {}", e),
            }
        })?;
        let risk = serde_json::to_string(&analysis.risk).map_err(|e| {
            FolioscanError::DatabaseQuery {
                reason: format!("cache serialization failed: {}", e),
            }
        })?;
        let momentum = serde_json::to_string(&analysis.momentum).map_err(|e| {
            FolioscanError::DatabaseQuery {
                reason: format!("cache serialization failed: {}", e),
            }
        })?;

        conn.execute(
            "INSERT OR REPLACE INTO analysis_cache
             (symbol, technical_signals, risk_metrics, momentum_score, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![analysis.symbol, technicals, risk, momentum, Self::now()],
        )
        .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    fn get(&self, symbol: &str) -> Result<Option<AnalysisCacheEntry>, FolioscanError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT symbol, technical_signals, risk_metrics, momentum_score, last_updated
                 FROM analysis_cache WHERE symbol = ?1",
            )
            .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut rows = stmt
            .query_map(params![symbol], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let Some(row) = rows.next() else {
            return Ok(None);
        };
        let (symbol, technicals_json, risk_json, momentum_json, last_updated) =
            row.map_err(|e: rusqlite::Error| FolioscanError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let decode_err = |e: serde_json::Error| FolioscanError::DatabaseQuery {
            reason: format!("cache deserialization failed: {}", e),
        };
        let entry = AnalysisCacheEntry {
            symbol,
            technicals: serde_json::from_str(&technicals_json).map_err(decode_err)?,
            risk: serde_json::from_str(&risk_json).map_err(decode_err)?,
            momentum: serde_json::from_str(&momentum_json).map_err(decode_err)?,
            last_updated: NaiveDateTime::parse_from_str(&last_updated, TIMESTAMP_FORMAT)
                .map_err(|e| FolioscanError::DatabaseQuery {
                    reason: format!("invalid cache timestamp: {}", e),
                })?,
        };
        Ok(Some(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::analyze_portfolio;
    use std::collections::HashMap;

    fn holding(symbol: &str, account_type: &str, quantity: f64, price: f64) -> Holding {
        Holding {
            symbol: symbol.into(),
            description: format!("{} position", symbol),
            quantity,
            cost_basis: price / 2.0,
            total_cost_basis: price / 2.0 * quantity,
            current_price: price,
            market_value: price * quantity,
            gain_loss: price / 2.0 * quantity,
            gain_loss_percent: 100.0,
            sector: "Technology".into(),
            industry: String::new(),
            account_type: account_type.into(),
            extended: None,
        }
    }

    fn bars(symbol: &str, count: usize) -> Vec<OhlcvBar> {
        (0..count)
            .map(|i| OhlcvBar {
                symbol: symbol.into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: 100.0,
                high: 102.0,
                low: 98.0,
                close: 100.0 + (i as f64 % 4.0),
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn replace_all_clears_previous_import() {
        let db = SqliteAdapter::in_memory().unwrap();
        db.replace_all(&[holding("AAPL", "Roth IRA", 10.0, 150.0)])
            .unwrap();
        db.replace_all(&[holding("MSFT", "Individual", 5.0, 400.0)])
            .unwrap();

        let all = db.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].symbol, "MSFT");
    }

    #[test]
    fn all_orders_by_market_value_descending() {
        let db = SqliteAdapter::in_memory().unwrap();
        db.replace_all(&[
            holding("SMALL", "Individual", 1.0, 10.0),
            holding("BIG", "Individual", 100.0, 100.0),
        ])
        .unwrap();

        let all = db.all().unwrap();
        assert_eq!(all[0].symbol, "BIG");
        assert_eq!(all[1].symbol, "SMALL");
    }

    #[test]
    fn same_symbol_in_two_accounts_is_two_rows() {
        let db = SqliteAdapter::in_memory().unwrap();
        db.replace_all(&[
            holding("AAPL", "Roth IRA", 10.0, 150.0),
            holding("AAPL", "Individual", 4.0, 150.0),
        ])
        .unwrap();
        assert_eq!(db.all().unwrap().len(), 2);
    }

    #[test]
    fn full_upsert_overwrites_by_key() {
        let db = SqliteAdapter::in_memory().unwrap();
        db.replace_all(&[holding("AAPL", "Roth IRA", 10.0, 150.0)])
            .unwrap();

        db.apply(&HoldingUpdate::Full(holding("AAPL", "Roth IRA", 12.0, 160.0)))
            .unwrap();

        let all = db.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].quantity, 12.0);
        assert_eq!(all[0].current_price, 160.0);
    }

    #[test]
    fn enrich_only_updates_quote_fields_everywhere() {
        let db = SqliteAdapter::in_memory().unwrap();
        let mut roth = holding("AAPL", "Roth IRA", 10.0, 150.0);
        roth.sector = String::new();
        db.replace_all(&[roth, holding("AAPL", "Individual", 4.0, 150.0)])
            .unwrap();

        db.apply(&HoldingUpdate::EnrichOnly {
            symbol: "AAPL".into(),
            current_price: 200.0,
            sector: "Technology".into(),
            industry: "Consumer Electronics".into(),
        })
        .unwrap();

        let all = db.all().unwrap();
        assert_eq!(all.len(), 2);
        for h in &all {
            assert_eq!(h.current_price, 200.0);
            assert_eq!(h.sector, "Technology");
            assert_eq!(h.industry, "Consumer Electronics");
            // quantity and cost basis untouched; value follows the new price
            assert_eq!(h.market_value, 200.0 * h.quantity);
            assert_eq!(h.gain_loss, 200.0 * h.quantity - h.total_cost_basis);
            assert_eq!(h.cost_basis, 75.0);
        }
    }

    #[test]
    fn enrich_only_never_inserts() {
        let db = SqliteAdapter::in_memory().unwrap();
        db.apply(&HoldingUpdate::EnrichOnly {
            symbol: "GHOST".into(),
            current_price: 10.0,
            sector: "X".into(),
            industry: String::new(),
        })
        .unwrap();
        assert!(db.all().unwrap().is_empty());
    }

    #[test]
    fn enrich_only_keeps_existing_sector_when_quote_has_none() {
        let db = SqliteAdapter::in_memory().unwrap();
        db.replace_all(&[holding("AAPL", "Roth IRA", 10.0, 150.0)])
            .unwrap();

        db.apply(&HoldingUpdate::EnrichOnly {
            symbol: "AAPL".into(),
            current_price: 155.0,
            sector: String::new(),
            industry: String::new(),
        })
        .unwrap();

        let all = db.all().unwrap();
        assert_eq!(all[0].sector, "Technology");
    }

    #[test]
    fn bar_cache_round_trip() {
        let db = SqliteAdapter::in_memory().unwrap();
        let inserted = bars("AAPL", 30);
        db.insert_bars(&inserted).unwrap();
        // Re-insert is idempotent: same primary keys, same count.
        db.insert_bars(&inserted).unwrap();

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let fetched = db.fetch_history("AAPL", start, end).unwrap();
        assert_eq!(fetched.len(), 30);
        assert_eq!(fetched, crate::domain::ohlcv::sort_ascending(&inserted));

        assert_eq!(db.list_symbols().unwrap(), vec!["AAPL"]);
        assert!(db.fetch_history("XYZ", start, end).unwrap().is_empty());
    }

    #[test]
    fn fetch_history_respects_window() {
        let db = SqliteAdapter::in_memory().unwrap();
        db.insert_bars(&bars("AAPL", 30)).unwrap();

        let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();
        let fetched = db.fetch_history("AAPL", start, end).unwrap();
        assert_eq!(fetched.len(), 3);
        assert!(fetched.iter().all(|b| b.date >= start && b.date <= end));
    }

    #[test]
    fn analysis_cache_round_trip_overwrites() {
        let db = SqliteAdapter::in_memory().unwrap();
        let holdings = vec![holding("AAPL", "Roth IRA", 10.0, 150.0)];
        let mut history = HashMap::new();
        history.insert("AAPL".to_string(), bars("AAPL", 60));
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let result = analyze_portfolio(&holdings, &history, None, as_of);
        assert_eq!(result.analyses.len(), 1);

        db.put(&result.analyses[0]).unwrap();
        let entry = db.get("AAPL").unwrap().unwrap();
        assert_eq!(entry.technicals, result.analyses[0].technicals);
        assert_eq!(entry.risk, result.analyses[0].risk);
        assert_eq!(entry.momentum, result.analyses[0].momentum);

        // Recompute and overwrite wholesale: still a single entry, identical
        // payload for identical inputs.
        let again = analyze_portfolio(&holdings, &history, None, as_of);
        db.put(&again.analyses[0]).unwrap();
        let entry2 = db.get("AAPL").unwrap().unwrap();
        assert_eq!(entry2.technicals, entry.technicals);
        assert_eq!(entry2.momentum, entry.momentum);

        assert!(db.get("MISSING").unwrap().is_none());
    }
}
