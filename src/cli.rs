//! CLI definition and dispatch.
//!
//! The CLI owns every impurity the domain refuses to: the clock, the
//! filesystem, and the ordering of cache writes. A single process drives one
//! command at a time, so analysis-cache writes are naturally serialized.

use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::FolioscanError;
use crate::domain::statement::parse_holdings;
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "folioscan", about = "Brokerage statement portfolio analytics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a brokerage statement CSV, replacing stored holdings
    Import {
        #[arg(short, long)]
        config: PathBuf,
        /// Statement file (either supported dialect; auto-detected)
        file: PathBuf,
        /// Skip quote enrichment after the import
        #[arg(long)]
        no_enrich: bool,
    },
    /// Load OHLCV history CSVs into the bar cache
    LoadHistory {
        #[arg(short, long)]
        config: PathBuf,
        /// Load a single symbol instead of everything in the history dir
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Recompute technicals, risk and momentum; refresh the analysis cache
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        /// Analyze a single symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Analysis date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        as_of: Option<String>,
    },
    /// List stored holdings
    Holdings {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the cached analysis for a symbol as JSON
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        symbol: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Import {
            config,
            file,
            no_enrich,
        } => run_import(&config, &file, no_enrich),
        Command::LoadHistory { config, symbol } => run_load_history(&config, symbol.as_deref()),
        Command::Analyze {
            config,
            symbol,
            as_of,
        } => run_analyze(&config, symbol.as_deref(), as_of.as_deref()),
        Command::Holdings { config } => run_holdings(&config),
        Command::Signals { config, symbol } => run_signals(&config, &symbol),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = FolioscanError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_import(config_path: &PathBuf, file: &PathBuf, no_enrich: bool) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let bytes = match fs::read(file) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: failed to read {}: {}", file.display(), e);
            return ExitCode::from(1);
        }
    };

    let holdings = parse_holdings(&bytes);
    if holdings.is_empty() {
        let err = FolioscanError::NoHoldings {
            file: file.display().to_string(),
        };
        eprintln!("error: {err}");
        return (&err).into();
    }
    eprintln!("Parsed {} holdings from {}", holdings.len(), file.display());

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::csv_history_adapter::CsvHistoryAdapter;
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::domain::holding::HoldingUpdate;
        use crate::ports::market_port::MarketDataPort;
        use crate::ports::store_port::HoldingsStore;

        let store = match SqliteAdapter::from_config(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        if let Err(e) = store.replace_all(&holdings) {
            eprintln!("error: {e}");
            return (&e).into();
        }

        let symbols: Vec<String> = unique_symbols(holdings.iter().map(|h| h.symbol.as_str()));
        eprintln!(
            "Imported {} holdings across {} symbols",
            holdings.len(),
            symbols.len()
        );

        // Best-effort quote enrichment: one symbol failing must not sink the
        // rest, and a missing quote source is not an error at all.
        if !no_enrich {
            if let Ok(market) = CsvHistoryAdapter::from_config(&config) {
                let mut enriched = 0usize;
                for symbol in &symbols {
                    match market.fetch_quote(symbol) {
                        Ok(Some(quote)) => {
                            let update = HoldingUpdate::EnrichOnly {
                                symbol: symbol.clone(),
                                current_price: quote.price,
                                sector: quote.sector,
                                industry: quote.industry,
                            };
                            match store.apply(&update) {
                                Ok(()) => enriched += 1,
                                Err(e) => log::warn!("enrich failed for {}: {}", symbol, e),
                            }
                        }
                        Ok(None) => {}
                        Err(e) => log::warn!("quote lookup failed for {}: {}", symbol, e),
                    }
                }
                eprintln!("Enriched {} of {} symbols with quote data", enriched, symbols.len());
            }
        }

        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, no_enrich, holdings);
        eprintln!("error: sqlite feature is required for import");
        ExitCode::from(1)
    }
}

fn run_load_history(config_path: &PathBuf, symbol: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::csv_history_adapter::CsvHistoryAdapter;
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::ports::market_port::MarketDataPort;

        let source = match CsvHistoryAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        let store = match SqliteAdapter::from_config(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let symbols = match symbol {
            Some(s) => vec![s.to_uppercase()],
            None => match source.list_symbols() {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            },
        };

        let (start, end) = full_window();
        let mut loaded = 0usize;
        for sym in &symbols {
            let bars = match source.fetch_history(sym, start, end) {
                Ok(b) => b,
                Err(e) => {
                    eprintln!("warning: skipping {} ({})", sym, e);
                    continue;
                }
            };
            if bars.is_empty() {
                eprintln!("warning: no bars for {}", sym);
                continue;
            }
            if let Err(e) = store.insert_bars(&bars) {
                eprintln!("error: {e}");
                return (&e).into();
            }
            eprintln!("  {}: {} bars", sym, bars.len());
            loaded += 1;
        }

        eprintln!("Loaded history for {} of {} symbols", loaded, symbols.len());
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, symbol);
        eprintln!("error: sqlite feature is required for load-history");
        ExitCode::from(1)
    }
}

fn run_analyze(config_path: &PathBuf, symbol: Option<&str>, as_of: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let as_of = match as_of {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                eprintln!("error: invalid --as-of date (expected YYYY-MM-DD)");
                return ExitCode::from(1);
            }
        },
        None => Local::now().date_naive(),
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::domain::analysis::analyze_portfolio;
        use crate::ports::market_port::MarketDataPort;
        use crate::ports::store_port::{AnalysisCacheStore, HoldingsStore};

        let store = match SqliteAdapter::from_config(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let mut holdings = match store.all() {
            Ok(h) => h,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        if let Some(s) = symbol {
            let wanted = s.to_uppercase();
            holdings.retain(|h| h.symbol.eq_ignore_ascii_case(&wanted));
        }
        if holdings.is_empty() {
            let err = FolioscanError::NoHoldings {
                file: "holdings store".into(),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }

        let lookback_days = config.get_int("analysis", "lookback_days", 365);
        let start = as_of - Duration::days(lookback_days);

        let benchmark_symbol = config
            .get_string("analysis", "benchmark")
            .unwrap_or_else(|| "SPY".to_string());
        let benchmark = match store.fetch_history(&benchmark_symbol, start, as_of) {
            Ok(bars) if !bars.is_empty() => Some(bars),
            Ok(_) => {
                eprintln!(
                    "warning: no history for benchmark {}; relative strength will read 0",
                    benchmark_symbol
                );
                None
            }
            Err(e) => {
                eprintln!("warning: benchmark fetch failed ({}); continuing without", e);
                None
            }
        };

        let symbols = unique_symbols(holdings.iter().map(|h| h.symbol.as_str()));
        let mut history = HashMap::new();
        for sym in &symbols {
            match store.fetch_history(sym, start, as_of) {
                Ok(bars) => {
                    history.insert(sym.clone(), bars);
                }
                Err(e) => log::warn!("history fetch failed for {}: {}", sym, e),
            }
        }

        let result = analyze_portfolio(&holdings, &history, benchmark.as_deref(), as_of);

        for analysis in &result.analyses {
            if let Err(e) = store.put(analysis) {
                eprintln!("error: {e}");
                return (&e).into();
            }
            eprintln!(
                "  {:<6} score {:>4}  {:<13} {:<10} risk {:<6} stop {:.2}",
                analysis.symbol,
                analysis.momentum.score,
                analysis.momentum.trend.to_string(),
                analysis.momentum.signal.to_string(),
                analysis.risk.risk_level.to_string(),
                analysis.risk.trailing_stop_price,
            );
        }
        for sym in &result.insufficient {
            eprintln!("  {:<6} insufficient data", sym);
        }

        eprintln!(
            "\nAnalyzed {} of {} symbols as of {}",
            result.analyses.len(),
            symbols.len(),
            as_of,
        );
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, as_of, symbol);
        eprintln!("error: sqlite feature is required for analyze");
        ExitCode::from(1)
    }
}

fn run_holdings(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::ports::store_port::HoldingsStore;

        let store = match SqliteAdapter::from_config(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let holdings = match store.all() {
            Ok(h) => h,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        if holdings.is_empty() {
            eprintln!("No holdings stored. Run `folioscan import` first.");
            return ExitCode::SUCCESS;
        }

        let total: f64 = holdings.iter().map(|h| h.market_value).sum();
        for h in &holdings {
            println!(
                "{:<6} {:<16} {:>12.2} sh @ {:>10.2}  value {:>12.2}  {}",
                h.symbol, h.account_type, h.quantity, h.current_price, h.market_value, h.sector,
            );
        }
        eprintln!("\n{} holdings, total value {:.2}", holdings.len(), total);
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        eprintln!("error: sqlite feature is required for holdings");
        ExitCode::from(1)
    }
}

fn run_signals(config_path: &PathBuf, symbol: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::ports::store_port::AnalysisCacheStore;

        let store = match SqliteAdapter::from_config(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        match store.get(&symbol.to_uppercase()) {
            Ok(Some(entry)) => match serde_json::to_string_pretty(&entry) {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: failed to render entry: {e}");
                    ExitCode::from(1)
                }
            },
            Ok(None) => {
                let err = FolioscanError::NoData {
                    symbol: symbol.to_uppercase(),
                };
                eprintln!("error: {err} (run `folioscan analyze` first)");
                (&err).into()
            }
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, symbol);
        eprintln!("error: sqlite feature is required for signals");
        ExitCode::from(1)
    }
}

/// First-seen-order unique symbols.
fn unique_symbols<'a>(symbols: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for s in symbols {
        if seen.insert(s) {
            out.push(s.to_string());
        }
    }
    out
}

/// Widest date window the bar stores accept.
fn full_window() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2999, 12, 31).unwrap(),
    )
}
