//! Fixed-layout market-data records
//!
//! Every record type is `repr(C)` with explicit reserved bytes in place of
//! implicit padding, all fields fixed-width, little-endian on disk. That
//! layout is the structural precondition for raw reinterpretation and
//! memory-mapped zero-copy reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Category of a market-data record stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feed {
    /// Not yet assigned; never valid for I/O.
    Unknown,
    /// Incremental order-book level updates.
    LevelUpdates,
    /// Anonymous trade prints.
    Trades,
    /// Raw exchange order log.
    OrdersLog,
}

impl Feed {
    /// Integer code stored in cache headers.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::LevelUpdates => 1,
            Self::Trades => 2,
            Self::OrdersLog => 3,
        }
    }

    /// Decode a header code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::LevelUpdates),
            2 => Some(Self::Trades),
            3 => Some(Self::OrdersLog),
            _ => None,
        }
    }

    /// Lowercase name used in cache file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::LevelUpdates => "levelupdates",
            Self::Trades => "trades",
            Self::OrdersLog => "orderslog",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trade direction. The integer codes double as position multipliers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Side {
    /// Buyer-initiated / long.
    Buy = 1,
    /// Seller-initiated / short.
    Sell = -1,
}

impl Side {
    /// Integer code stored in records.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Decode a record code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Buy),
            -1 => Some(Self::Sell),
            _ => None,
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Signed position multiplier: +1 for buys, -1 for sells.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        self as i32 as f64
    }
}

/// Kind of an order-log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Order placed.
    Place,
    /// Order cancelled.
    Cancel,
    /// Order executed.
    Execute,
}

impl EntryType {
    /// Integer code stored in records.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Place => 0,
            Self::Cancel => 1,
            Self::Execute => 2,
        }
    }

    /// Decode a record code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Place),
            1 => Some(Self::Cancel),
            2 => Some(Self::Execute),
            _ => None,
        }
    }
}

/// Compile-time binding of a record payload to the feed it belongs to.
pub trait Payload: AsBytes + FromBytes + Copy + Send + Sync + 'static {
    /// The feed this payload type is stored under.
    const FEED: Feed;
}

/// Set-or-clear instruction for one price level on one side of the book.
#[derive(Clone, Copy, Debug, PartialEq, FromZeroes, FromBytes, AsBytes)]
#[repr(C)]
pub struct LevelUpdate {
    /// Price level.
    pub price: f64,
    /// New absolute quantity at the level; 0 clears it.
    pub quantity: f64,
    /// 1 for the bid side, 0 for the ask side.
    pub is_bid: u8,
    /// 1 when the update is part of an initial snapshot.
    pub is_snapshot: u8,
    /// Explicit tail padding; always zero.
    pub _reserved: [u8; 6],
}

impl LevelUpdate {
    /// Build an update, zeroing the reserved bytes.
    #[must_use]
    pub fn new(price: f64, quantity: f64, is_bid: bool, is_snapshot: bool) -> Self {
        Self {
            price,
            quantity,
            is_bid: u8::from(is_bid),
            is_snapshot: u8::from(is_snapshot),
            _reserved: [0; 6],
        }
    }

    /// Whether the update targets the bid side.
    #[must_use]
    pub const fn is_bid(&self) -> bool {
        self.is_bid != 0
    }

    /// Whether the update clears its level.
    #[must_use]
    pub fn is_removal(&self) -> bool {
        self.quantity == 0.0
    }
}

impl Payload for LevelUpdate {
    const FEED: Feed = Feed::LevelUpdates;
}

/// One anonymous trade print.
#[derive(Clone, Copy, Debug, PartialEq, FromZeroes, FromBytes, AsBytes)]
#[repr(C)]
pub struct TradeUpdate {
    /// Aggressor side code (see [`Side`]).
    pub side: i32,
    /// Explicit alignment padding; always zero.
    pub _reserved: [u8; 4],
    /// Execution price.
    pub price: f64,
    /// Executed quantity.
    pub quantity: f64,
    /// Exchange trade id.
    pub trade_id: i64,
}

impl TradeUpdate {
    /// Build a trade print, zeroing the reserved bytes.
    #[must_use]
    pub fn new(side: Side, price: f64, quantity: f64, trade_id: i64) -> Self {
        Self {
            side: side.code(),
            _reserved: [0; 4],
            price,
            quantity,
            trade_id,
        }
    }

    /// Decoded aggressor side, `None` for a corrupt code.
    #[must_use]
    pub const fn side(&self) -> Option<Side> {
        Side::from_code(self.side)
    }

    /// Whether the aggressor was the buyer.
    #[must_use]
    pub fn is_buyer(&self) -> bool {
        self.side() == Some(Side::Buy)
    }

    /// Notional volume of the print.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.price * self.quantity
    }
}

impl Payload for TradeUpdate {
    const FEED: Feed = Feed::Trades;
}

/// One raw order-log entry.
#[derive(Clone, Copy, Debug, PartialEq, FromZeroes, FromBytes, AsBytes)]
#[repr(C)]
pub struct OrderUpdate {
    /// Exchange order id.
    pub order_id: i64,
    /// Side code (see [`Side`]).
    pub side: i32,
    /// Entry-type code (see [`EntryType`]).
    pub entry_type: i32,
    /// Exchange-assigned event timestamp, unix millis.
    pub timestamp: i64,
    /// Order price.
    pub price: f64,
    /// Order quantity.
    pub quantity: f64,
    /// Trade id for execution entries, 0 otherwise.
    pub trade_id: i64,
    /// Execution price for execution entries, 0 otherwise.
    pub execution_price: f64,
}

impl OrderUpdate {
    /// Decoded side, `None` for a corrupt code.
    #[must_use]
    pub const fn side(&self) -> Option<Side> {
        Side::from_code(self.side)
    }

    /// Decoded entry type, `None` for a corrupt code.
    #[must_use]
    pub const fn entry_type(&self) -> Option<EntryType> {
        EntryType::from_code(self.entry_type)
    }
}

impl Payload for OrderUpdate {
    const FEED: Feed = Feed::OrdersLog;
}

/// A timestamped record: 8 bytes of unix-millis timestamp followed
/// immediately by the fixed-size payload.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct MarketDataItem<T> {
    /// Event timestamp, unix millis.
    pub timestamp: i64,
    /// Feed-specific payload.
    pub payload: T,
}

impl<T> MarketDataItem<T> {
    /// Pair a payload with its timestamp.
    #[must_use]
    pub const fn new(timestamp: i64, payload: T) -> Self {
        Self { timestamp, payload }
    }

    /// The timestamp as a UTC datetime; `None` when out of chrono's range.
    #[must_use]
    pub fn date_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}
