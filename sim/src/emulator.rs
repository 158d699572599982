//! Replay and matching engine for one (symbol, date) session
//!
//! The level-update stream drives time: all updates sharing a timestamp are
//! applied first, and only when a strictly later timestamp arrives does the
//! strategy see the completed book state. Trades with timestamps at or
//! before the flushed instant are delivered before the snapshot, so the
//! strategy never observes a book that is ahead of the tape.

use crate::orders::{OrderKind, UserOrder};
use crate::strategy::{OrderSink, Strategy};
use common::{
    approx_ge, approx_gt, approx_le, CacheKey, LevelUpdate, MarketDataItem, Side, TradeUpdate,
};
use lob::{OrderBook, PriceLevel};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use storage::{CacheError, CacheReader, CacheRecords};
use tracing::{debug, info, warn};

/// f64 price as a map key, ordered by `total_cmp`.
#[derive(Clone, Copy, Debug)]
struct OrderedPrice(f64);

impl PartialEq for OrderedPrice {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for OrderedPrice {}

impl PartialOrd for OrderedPrice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedPrice {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// The session engine. Generic over the reader mode so streaming and
/// memory-mapped replays share one code path.
pub struct Emulator<S, L, T>
where
    S: Strategy,
    L: CacheRecords<LevelUpdate>,
    T: CacheRecords<TradeUpdate>,
{
    book: OrderBook,
    timestamp: i64,
    started: bool,
    resting_bids: BTreeMap<OrderedPrice, UserOrder>,
    resting_asks: BTreeMap<OrderedPrice, UserOrder>,
    levels: L,
    trades: T,
    strategy: S,
    sink: OrderSink,
}

impl<S: Strategy>
    Emulator<S, CacheReader<LevelUpdate>, CacheReader<TradeUpdate>>
{
    /// Open buffered cache readers for both feeds of `key` under `root`.
    ///
    /// # Errors
    /// Any open-time [`CacheError`] of either file.
    pub fn open(root: impl AsRef<Path>, key: CacheKey, strategy: S) -> Result<Self, CacheError> {
        let root = root.as_ref();
        Ok(Self::with_readers(
            CacheReader::open(root, key)?,
            CacheReader::open(root, key)?,
            strategy,
        ))
    }
}

impl<S, L, T> Emulator<S, L, T>
where
    S: Strategy,
    L: CacheRecords<LevelUpdate>,
    T: CacheRecords<TradeUpdate>,
{
    /// Build a session over already-open readers.
    pub fn with_readers(levels: L, trades: T, strategy: S) -> Self {
        Self {
            book: OrderBook::new(),
            timestamp: 0,
            started: false,
            resting_bids: BTreeMap::new(),
            resting_asks: BTreeMap::new(),
            levels,
            trades,
            strategy,
            sink: OrderSink::default(),
        }
    }

    /// The strategy, for inspection after (or between) runs.
    pub const fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Give the strategy back, dropping the session.
    pub fn into_strategy(self) -> S {
        self.strategy
    }

    /// The rebuilt book.
    pub const fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Resting (unmatched) user orders, bids then asks.
    pub fn resting_orders(&self) -> impl Iterator<Item = &UserOrder> {
        self.resting_bids.values().chain(self.resting_asks.values())
    }

    /// Replay the whole session.
    ///
    /// # Errors
    /// The first [`CacheError`] either stream raises; the session is not
    /// resumable afterwards.
    pub fn run(&mut self) -> Result<(), CacheError> {
        info!(
            key = %self.levels.key(),
            level_updates = self.levels.item_count(),
            trades = self.trades.item_count(),
            "session start"
        );

        while let Some(item) = self.levels.next_record()? {
            if !self.started {
                // First record pins the clock without flushing an empty book.
                self.timestamp = item.timestamp;
                self.started = true;
            } else if item.timestamp > self.timestamp {
                self.flush()?;
                self.timestamp = item.timestamp;
            }
            self.book.apply(&item);
        }

        if self.started {
            self.flush()?;
        }

        // Resting orders are never matched; they die with the session.
        let resting = self.resting_bids.len() + self.resting_asks.len();
        if resting > 0 {
            info!(resting, "resting orders left unmatched at session end");
        }
        self.strategy.simulation_finished();
        info!(key = %self.levels.key(), "session finished");
        Ok(())
    }

    /// Deliver everything the strategy may now see for `self.timestamp`:
    /// first all trades up to and including it, then the book snapshot.
    fn flush(&mut self) -> Result<(), CacheError> {
        while let Some(ts) = self.trades.peek_timestamp() {
            if ts > self.timestamp {
                break;
            }
            let Some(trade) = self.trades.next_record()? else {
                break;
            };
            self.strategy.trade_received(&mut self.sink, trade);
            self.match_queued_orders();
        }

        let snapshot = MarketDataItem::new(self.timestamp, self.book.snapshot());
        self.strategy.order_book_updated(&mut self.sink, snapshot);
        self.match_queued_orders();
        Ok(())
    }

    fn match_queued_orders(&mut self) {
        while let Some(order) = self.sink.pop() {
            self.process_user_order(order);
        }
    }

    fn process_user_order(&mut self, order: UserOrder) {
        match order.kind {
            OrderKind::Market => self.execute_at_touch(order),
            OrderKind::Limit => {
                let crosses = match order.side {
                    Side::Buy => {
                        self.book.ask_depth() > 0
                            && approx_ge(order.price, self.book.best_ask().price)
                    }
                    Side::Sell => {
                        self.book.bid_depth() > 0
                            && approx_le(order.price, self.book.best_bid().price)
                    }
                };
                if crosses {
                    self.execute_at_touch(order);
                } else {
                    self.rest(order);
                }
            }
        }
    }

    /// One execution against the current opposite touch, capped at the
    /// touch's quantity and priced at the touch. The consumed liquidity is
    /// removed through a synthetic level update so later matching sees the
    /// thinner book.
    fn execute_at_touch(&mut self, mut order: UserOrder) {
        let touch: PriceLevel = match order.side {
            Side::Buy => self.book.best_ask(),
            Side::Sell => self.book.best_bid(),
        };
        if !approx_gt(touch.quantity, 0.0) {
            warn!(
                order_id = order.id,
                side = ?order.side,
                "no liquidity on the opposite side, order dropped"
            );
            return;
        }

        let quantity = order.quantity.min(touch.quantity);
        let execution = order.fill(touch.price, quantity, self.timestamp);
        if approx_gt(order.quantity, 0.0) {
            debug!(
                order_id = order.id,
                remaining = order.quantity,
                "partial fill capped at the touch, remainder dropped"
            );
        }

        let left = touch.quantity - quantity;
        let update = LevelUpdate::new(
            touch.price,
            if approx_gt(left, 0.0) { left } else { 0.0 },
            order.side == Side::Sell,
            false,
        );
        self.book
            .apply(&MarketDataItem::new(self.timestamp, update));

        self.strategy.execution_received(execution);
    }

    fn rest(&mut self, order: UserOrder) {
        debug!(
            order_id = order.id,
            side = ?order.side,
            price = order.price,
            "limit order resting"
        );
        let side = match order.side {
            Side::Buy => &mut self.resting_bids,
            Side::Sell => &mut self.resting_asks,
        };
        if let Some(previous) = side.insert(OrderedPrice(order.price), order) {
            warn!(
                order_id = previous.id,
                price = previous.price,
                "resting order replaced at the same price"
            );
        }
    }
}
