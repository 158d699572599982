//! Bundled example strategy

use crate::orders::{UserExecution, UserOrder};
use crate::stats::{ewma, std_dev};
use crate::strategy::{OrderSink, Strategy};
use chrono::Timelike;
use common::{MarketDataItem, Side, TradeUpdate};
use lob::BookSnapshot;
use std::collections::VecDeque;
use std::ops::Range;
use tracing::{debug, info};

/// Trades tracked in the rolling volume window.
const WINDOW: usize = 128;

/// EWMA smoothing factor for the volume baseline.
const ALPHA: f64 = 0.27;

/// Broker fee as a fraction of executed volume (2.5 bps).
const FEE: f64 = 0.000_25;

/// Volume-impulse taker: keeps a rolling window of recent trade volumes and,
/// when their dispersion decisively exceeds the smoothed baseline, follows
/// the aggressor with a small order at the touch.
pub struct VolumeImpulse {
    volumes: VecDeque<f64>,
    best_bid: f64,
    best_ask: f64,
    executions: Vec<UserExecution>,
    /// UTC hours during which the strategy is allowed to trade.
    active_hours: Range<u32>,
    order_quantity: f64,
}

impl Default for VolumeImpulse {
    fn default() -> Self {
        Self::new(10..18, 2.0)
    }
}

impl VolumeImpulse {
    /// Strategy trading `order_quantity` lots inside `active_hours` (UTC).
    #[must_use]
    pub fn new(active_hours: Range<u32>, order_quantity: f64) -> Self {
        Self {
            volumes: VecDeque::with_capacity(WINDOW),
            best_bid: 0.0,
            best_ask: 0.0,
            executions: Vec::new(),
            active_hours,
            order_quantity,
        }
    }

    /// Executions collected so far.
    #[must_use]
    pub fn executions(&self) -> &[UserExecution] {
        &self.executions
    }

    fn in_active_hours(&self, timestamp: i64) -> bool {
        chrono::DateTime::from_timestamp_millis(timestamp)
            .is_some_and(|dt| self.active_hours.contains(&dt.hour()))
    }

    fn impulse(&self) -> bool {
        if self.volumes.len() < WINDOW {
            return false;
        }
        let window: Vec<f64> = self.volumes.iter().copied().collect();
        let sigma = std_dev(&window);
        let baseline = ewma(&window, ALPHA);
        sigma > 0.0 && baseline > 0.0 && sigma.log10() > baseline.log10()
    }
}

impl Strategy for VolumeImpulse {
    fn order_book_updated(
        &mut self,
        _sink: &mut OrderSink,
        snapshot: MarketDataItem<BookSnapshot>,
    ) {
        self.best_bid = snapshot.payload.best_bid().price;
        self.best_ask = snapshot.payload.best_ask().price;
    }

    fn trade_received(&mut self, sink: &mut OrderSink, trade: MarketDataItem<TradeUpdate>) {
        if self.volumes.len() == WINDOW {
            self.volumes.pop_front();
        }
        self.volumes.push_back(trade.payload.volume());

        if !self.impulse() || !self.in_active_hours(trade.timestamp) {
            return;
        }
        let Some(side) = trade.payload.side() else {
            return;
        };
        // Follow the aggressor with an immediately-crossing limit at the
        // touch; a limit (not a market order) caps the worst-case price.
        let price = match side {
            Side::Buy => self.best_ask,
            Side::Sell => self.best_bid,
        };
        if price <= 0.0 {
            return;
        }
        debug!(ts = trade.timestamp, ?side, price, "volume impulse");
        sink.place(UserOrder::limit(
            side,
            price,
            self.order_quantity,
            trade.timestamp,
        ));
        self.volumes.clear();
    }

    fn execution_received(&mut self, execution: UserExecution) {
        self.executions.push(execution);
    }

    fn simulation_finished(&mut self) {
        let cash: f64 = self.executions.iter().map(UserExecution::cash_delta).sum();
        let position: f64 = self
            .executions
            .iter()
            .map(UserExecution::position_delta)
            .sum();
        let mid = if self.best_bid > 0.0 && self.best_ask > 0.0 {
            f64::midpoint(self.best_bid, self.best_ask)
        } else {
            0.0
        };
        let dirty = cash + position * mid;
        let fee: f64 = self.executions.iter().map(UserExecution::volume).sum::<f64>() * FEE;
        info!(
            executions = self.executions.len(),
            position,
            dirty_pnl = dirty,
            fee,
            clean_pnl = dirty - fee,
            "session summary"
        );
    }
}
