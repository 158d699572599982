//! Aggregate-by-level book state

use common::{approx_lt, LevelUpdate, MarketDataItem};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Total order over f64 prices so they can key a `BTreeMap`. NaN prices
/// never enter the book through well-formed updates; `total_cmp` keeps the
/// map coherent even if one slips through.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PriceKey(pub(crate) f64);

impl PartialEq for PriceKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for PriceKey {}

impl PartialOrd for PriceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// One aggregated price level.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PriceLevel {
    /// Price of the level.
    pub price: f64,
    /// Total resting quantity at the price.
    pub quantity: f64,
}

impl PriceLevel {
    /// Build a level.
    #[must_use]
    pub const fn new(price: f64, quantity: f64) -> Self {
        Self { price, quantity }
    }
}

/// Both sides of the book plus the timestamp of the latest applied update.
#[derive(Debug, Default)]
pub struct OrderBook {
    bids: BTreeMap<PriceKey, f64>,
    asks: BTreeMap<PriceKey, f64>,
    timestamp: i64,
}

impl OrderBook {
    /// Empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one level update. Zero quantity clears the level (a no-op when
    /// it is already absent); anything else overwrites the level's
    /// aggregate quantity. The book timestamp advances unconditionally.
    pub fn apply(&mut self, item: &MarketDataItem<LevelUpdate>) {
        self.timestamp = item.timestamp;
        let update = &item.payload;
        let side = if update.is_bid() {
            &mut self.bids
        } else {
            &mut self.asks
        };
        if update.is_removal() {
            side.remove(&PriceKey(update.price));
        } else {
            side.insert(PriceKey(update.price), update.quantity);
        }
    }

    /// Timestamp of the latest applied update.
    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Best (highest) bid; the zero level when the side is empty.
    #[must_use]
    pub fn best_bid(&self) -> PriceLevel {
        self.bids
            .last_key_value()
            .map_or_else(PriceLevel::default, |(k, &q)| PriceLevel::new(k.0, q))
    }

    /// Best (lowest) ask; the zero level when the side is empty.
    #[must_use]
    pub fn best_ask(&self) -> PriceLevel {
        self.asks
            .first_key_value()
            .map_or_else(PriceLevel::default, |(k, &q)| PriceLevel::new(k.0, q))
    }

    /// Both sides populated; matching against an unready book is unsound.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }

    /// Best bid strictly below best ask. A crossed book is reported, never
    /// auto-corrected; the feed is the authority.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        !self.is_ready() || approx_lt(self.best_bid().price, self.best_ask().price)
    }

    /// Number of populated bid levels.
    #[must_use]
    pub fn bid_depth(&self) -> usize {
        self.bids.len()
    }

    /// Number of populated ask levels.
    #[must_use]
    pub fn ask_depth(&self) -> usize {
        self.asks.len()
    }

    /// Bid levels, best (highest price) first.
    pub fn bids(&self) -> impl Iterator<Item = PriceLevel> + '_ {
        self.bids
            .iter()
            .rev()
            .map(|(k, &q)| PriceLevel::new(k.0, q))
    }

    /// Ask levels, best (lowest price) first.
    pub fn asks(&self) -> impl Iterator<Item = PriceLevel> + '_ {
        self.asks.iter().map(|(k, &q)| PriceLevel::new(k.0, q))
    }
}
