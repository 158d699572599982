//! The strategy boundary
//!
//! Strategies receive market events and report executions through plain
//! callbacks; the only outbound capability is the [`OrderSink`] handed into
//! each market-event callback. Orders queued there are matched immediately
//! after the callback returns, which breaks the strategy/emulator ownership
//! cycle without reference counting.

use crate::orders::{UserExecution, UserOrder};
use common::{MarketDataItem, TradeUpdate};
use lob::BookSnapshot;
use std::collections::VecDeque;

/// Outbound order queue exposed to strategies during callbacks.
#[derive(Debug, Default)]
pub struct OrderSink {
    queue: VecDeque<UserOrder>,
}

impl OrderSink {
    /// Queue an order for matching right after the current callback.
    pub fn place(&mut self, order: UserOrder) {
        self.queue.push_back(order);
    }

    pub(crate) fn pop(&mut self) -> Option<UserOrder> {
        self.queue.pop_front()
    }
}

/// A backtest participant.
pub trait Strategy {
    /// The book changed; `snapshot` is the post-change fixed-depth view.
    fn order_book_updated(
        &mut self,
        sink: &mut OrderSink,
        snapshot: MarketDataItem<BookSnapshot>,
    );

    /// An anonymous market trade printed.
    fn trade_received(&mut self, sink: &mut OrderSink, trade: MarketDataItem<TradeUpdate>);

    /// One of this strategy's orders (partially) filled.
    fn execution_received(&mut self, execution: UserExecution);

    /// The session's data is exhausted; last chance to settle state.
    fn simulation_finished(&mut self);
}

/// Records every callback verbatim; the assertion surface for emulator
/// tests.
#[derive(Debug, Default)]
pub struct RecordingStrategy {
    /// Snapshots in delivery order.
    pub snapshots: Vec<MarketDataItem<BookSnapshot>>,
    /// Trades in delivery order.
    pub trades: Vec<MarketDataItem<TradeUpdate>>,
    /// Executions in delivery order.
    pub executions: Vec<UserExecution>,
    /// Whether `simulation_finished` ran.
    pub finished: bool,
    /// Orders to place on the next book update.
    pub pending: VecDeque<UserOrder>,
}

impl RecordingStrategy {
    /// Queue `order` for placement on the next book update.
    pub fn place_on_next_snapshot(&mut self, order: UserOrder) {
        self.pending.push_back(order);
    }
}

impl Strategy for RecordingStrategy {
    fn order_book_updated(
        &mut self,
        sink: &mut OrderSink,
        snapshot: MarketDataItem<BookSnapshot>,
    ) {
        self.snapshots.push(snapshot);
        while let Some(order) = self.pending.pop_front() {
            sink.place(order);
        }
    }

    fn trade_received(&mut self, _sink: &mut OrderSink, trade: MarketDataItem<TradeUpdate>) {
        self.trades.push(trade);
    }

    fn execution_received(&mut self, execution: UserExecution) {
        self.executions.push(execution);
    }

    fn simulation_finished(&mut self) {
        self.finished = true;
    }
}
