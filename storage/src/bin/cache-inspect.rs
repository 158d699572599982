//! Inspect cache files from the command line
//!
//! `header` prints the decoded 72-byte header of one file; `scan` streams
//! its records in human-readable form.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(missing_docs)]

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use common::{
    CacheKey, Feed, LevelUpdate, OrderUpdate, Payload, Symbol, TradeUpdate,
};
use std::fmt::Debug;
use std::fs::File;
use std::path::PathBuf;
use storage::{read_struct, CacheMeta, CacheReader, CacheRecords};

/// Cache file inspection tool.
#[derive(Parser)]
#[command(name = "cache-inspect", about = "Inspect market-data cache files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the decoded header of one cache file.
    Header(Target),
    /// Stream records of one cache file to stdout.
    Scan {
        #[command(flatten)]
        target: Target,
        /// Stop after this many records.
        #[arg(long)]
        limit: Option<u64>,
    },
}

/// Addresses one cache file.
#[derive(Args)]
struct Target {
    /// Cache root directory.
    #[arg(long)]
    root: PathBuf,
    /// Symbol in canonical form, e.g. `BTC@USDT.binance-futures`.
    #[arg(long)]
    symbol: String,
    /// Trading date, `yyyy-mm-dd`.
    #[arg(long)]
    date: NaiveDate,
    /// Feed name: `levelupdates`, `trades` or `orderslog`.
    #[arg(long)]
    feed: String,
}

impl Target {
    fn key(&self) -> Result<CacheKey> {
        let symbol = Symbol::parse(&self.symbol, None)
            .with_context(|| format!("bad symbol {:?}", self.symbol))?;
        Ok(CacheKey::new(symbol, self.date).with_feed(parse_feed(&self.feed)?))
    }
}

fn parse_feed(name: &str) -> Result<Feed> {
    for feed in [Feed::LevelUpdates, Feed::Trades, Feed::OrdersLog] {
        if feed.as_str() == name {
            return Ok(feed);
        }
    }
    bail!("unknown feed {name:?}, expected levelupdates, trades or orderslog");
}

fn print_header(target: &Target) -> Result<()> {
    let key = target.key()?;
    let path = key.file_path(&target.root)?;
    let mut file =
        File::open(&path).with_context(|| format!("open {}", path.display()))?;
    let meta: CacheMeta = read_struct(&mut file)?
        .with_context(|| format!("{} has no header", path.display()))?;

    println!("path:        {}", path.display());
    println!("symbol:      {}", meta.symbol);
    println!("date:        {}", meta.date());
    match meta.feed() {
        Ok(feed) => println!("feed:        {feed}"),
        Err(_) => println!("feed:        unknown code {}", meta.feed),
    }
    match meta.compression() {
        Ok(c) => println!("compression: {c} (level {})", meta.level),
        Err(_) => println!("compression: unknown code {}", meta.compression),
    }
    println!("items:       {}", meta.item_count);
    println!("version:     {}", meta.version);
    println!("built:       {} ms", meta.build_time_ms);
    Ok(())
}

fn scan<T: Payload + Debug>(target: &Target, limit: Option<u64>) -> Result<()> {
    let key = target.key()?;
    let mut reader = CacheReader::<T>::open(&target.root, key)?;
    if reader.is_empty() {
        println!("(empty cache, {} records)", reader.item_count());
        return Ok(());
    }
    let limit = limit.unwrap_or(u64::MAX);
    let mut printed = 0u64;
    while printed < limit {
        let Some(item) = reader.next_record()? else {
            break;
        };
        println!("{} {:?}", item.timestamp, item.payload);
        printed += 1;
    }
    println!("({printed} of {} records)", reader.item_count());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Header(target) => print_header(&target),
        Command::Scan { target, limit } => match parse_feed(&target.feed)? {
            Feed::LevelUpdates => scan::<LevelUpdate>(&target, limit),
            Feed::Trades => scan::<TradeUpdate>(&target, limit),
            Feed::OrdersLog => scan::<OrderUpdate>(&target, limit),
            Feed::Unknown => bail!("feed is not set"),
        },
    }
}
