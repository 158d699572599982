//! Shared identity and market-data types for the backtest stack

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod asset;
pub mod exchange;
pub mod key;
pub mod market;
pub mod math;
pub mod symbol;
pub mod time;

pub use asset::Asset;
pub use exchange::Exchange;
pub use key::CacheKey;
pub use market::{
    EntryType, Feed, LevelUpdate, MarketDataItem, OrderUpdate, Payload, Side, TradeUpdate,
};
pub use math::{approx_eq, approx_ge, approx_gt, approx_le, approx_lt};
pub use symbol::{Symbol, SymbolError};
pub use time::{next_order_id, unix_millis_now};
