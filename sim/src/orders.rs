//! User orders and their executions

use common::{next_order_id, Side};
use uuid::Uuid;

/// How an order prices itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderKind {
    /// Execute at the opposite touch, whatever it is.
    Market,
    /// Execute at `price` or better, otherwise rest.
    Limit,
}

/// One order placed by a strategy.
#[derive(Clone, Copy, Debug)]
pub struct UserOrder {
    /// Session-unique order id.
    pub id: i64,
    /// Pricing mode.
    pub kind: OrderKind,
    /// Direction.
    pub side: Side,
    /// Limit price; unused for market orders.
    pub price: f64,
    /// Remaining quantity.
    pub quantity: f64,
    /// Simulation timestamp at placement, unix millis.
    pub timestamp: i64,
    /// Caller-visible idempotency handle.
    pub client_order_id: Uuid,
}

impl UserOrder {
    /// Market order for `quantity`.
    #[must_use]
    pub fn market(side: Side, quantity: f64, timestamp: i64) -> Self {
        Self {
            id: next_order_id(),
            kind: OrderKind::Market,
            side,
            price: 0.0,
            quantity,
            timestamp,
            client_order_id: Uuid::new_v4(),
        }
    }

    /// Limit order for `quantity` at `price`.
    #[must_use]
    pub fn limit(side: Side, price: f64, quantity: f64, timestamp: i64) -> Self {
        Self {
            id: next_order_id(),
            kind: OrderKind::Limit,
            side,
            price,
            quantity,
            timestamp,
            client_order_id: Uuid::new_v4(),
        }
    }

    /// Consume `quantity` of the order at `execution_price`, minting the
    /// execution report. The caller caps `quantity` at what the book offers.
    pub fn fill(&mut self, execution_price: f64, quantity: f64, timestamp: i64) -> UserExecution {
        self.quantity -= quantity;
        UserExecution {
            trade_id: next_order_id(),
            order_id: self.id,
            side: self.side,
            execution_price,
            executed_quantity: quantity,
            timestamp,
        }
    }
}

/// One fill of a user order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UserExecution {
    /// Synthetic trade id.
    pub trade_id: i64,
    /// Order the fill belongs to.
    pub order_id: i64,
    /// Direction of the filled order.
    pub side: Side,
    /// Price actually paid, the touched book level's price.
    pub execution_price: f64,
    /// Quantity taken in this fill.
    pub executed_quantity: f64,
    /// Simulation timestamp of the fill, unix millis.
    pub timestamp: i64,
}

impl UserExecution {
    /// Notional volume of the fill.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.execution_price * self.executed_quantity
    }

    /// Signed cash delta: negative when buying, positive when selling.
    #[must_use]
    pub fn cash_delta(&self) -> f64 {
        -self.side.multiplier() * self.volume()
    }

    /// Signed position delta in units of the base asset.
    #[must_use]
    pub fn position_delta(&self) -> f64 {
        self.side.multiplier() * self.executed_quantity
    }
}
