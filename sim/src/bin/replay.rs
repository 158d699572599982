//! Replay one cached session through the bundled strategy

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(missing_docs)]

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use common::{CacheKey, Exchange, LevelUpdate, Symbol, TradeUpdate};
use sim::{Emulator, VolumeImpulse};
use std::path::PathBuf;
use storage::MappedReader;

/// Replay a cached (symbol, date) session.
#[derive(Parser)]
#[command(name = "replay", about = "Replay one cached market-data session")]
struct Cli {
    /// Cache root directory.
    #[arg(long)]
    data_dir: PathBuf,
    /// Symbol, canonical `{base}@{quote}.{exchange}` or `{base}@{quote}`
    /// with `--exchange`.
    #[arg(long)]
    symbol: String,
    /// Default exchange when the symbol does not name one.
    #[arg(long)]
    exchange: Option<String>,
    /// Trading date, `yyyy-mm-dd`.
    #[arg(long)]
    date: NaiveDate,
    /// Use memory-mapped readers (requires uncompressed files).
    #[arg(long)]
    mapped: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let default_exchange = cli
        .exchange
        .as_deref()
        .map(Exchange::from_name)
        .transpose()?;
    let symbol = Symbol::parse(&cli.symbol, default_exchange)
        .with_context(|| format!("bad symbol {:?}", cli.symbol))?;
    let key = CacheKey::new(symbol, cli.date);
    let strategy = VolumeImpulse::default();

    if cli.mapped {
        let levels = MappedReader::<LevelUpdate>::open(&cli.data_dir, key)?;
        let trades = MappedReader::<TradeUpdate>::open(&cli.data_dir, key)?;
        Emulator::with_readers(levels, trades, strategy).run()?;
    } else {
        Emulator::open(&cli.data_dir, key, strategy)?.run()?;
    }
    Ok(())
}
