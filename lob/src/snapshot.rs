//! Fixed-depth book snapshots

use crate::book::{OrderBook, PriceLevel};

/// Levels per side captured in a snapshot.
pub const DEPTH: usize = 64;

/// Flat copy of the top [`DEPTH`] levels of each side. Parallel arrays,
/// best level first, zero-padded past the populated depth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BookSnapshot {
    /// Bid prices, best (highest) first.
    pub bid_price: [f64; DEPTH],
    /// Bid quantities, aligned with `bid_price`.
    pub bid_quantity: [f64; DEPTH],
    /// Ask prices, best (lowest) first.
    pub ask_price: [f64; DEPTH],
    /// Ask quantities, aligned with `ask_price`.
    pub ask_quantity: [f64; DEPTH],
}

impl Default for BookSnapshot {
    fn default() -> Self {
        Self {
            bid_price: [0.0; DEPTH],
            bid_quantity: [0.0; DEPTH],
            ask_price: [0.0; DEPTH],
            ask_quantity: [0.0; DEPTH],
        }
    }
}

impl BookSnapshot {
    /// Best bid of the snapshot; the zero level when the side was empty.
    #[must_use]
    pub const fn best_bid(&self) -> PriceLevel {
        PriceLevel::new(self.bid_price[0], self.bid_quantity[0])
    }

    /// Best ask of the snapshot; the zero level when the side was empty.
    #[must_use]
    pub const fn best_ask(&self) -> PriceLevel {
        PriceLevel::new(self.ask_price[0], self.ask_quantity[0])
    }
}

impl OrderBook {
    /// Copy the top [`DEPTH`] levels of each side. Both sides are walked in
    /// lock-step with independent exhaustion, so one deep side never
    /// truncates the other; shallower sides stay zero-padded.
    #[must_use]
    pub fn snapshot(&self) -> BookSnapshot {
        let mut snap = BookSnapshot::default();
        let mut bids = self.bids();
        let mut asks = self.asks();
        let mut bids_done = false;
        let mut asks_done = false;

        for i in 0..DEPTH {
            if !bids_done {
                match bids.next() {
                    Some(level) => {
                        snap.bid_price[i] = level.price;
                        snap.bid_quantity[i] = level.quantity;
                    }
                    None => bids_done = true,
                }
            }
            if !asks_done {
                match asks.next() {
                    Some(level) => {
                        snap.ask_price[i] = level.price;
                        snap.ask_quantity[i] = level.quantity;
                    }
                    None => asks_done = true,
                }
            }
            if bids_done && asks_done {
                break;
            }
        }
        snap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{LevelUpdate, MarketDataItem};

    fn apply(book: &mut OrderBook, price: f64, qty: f64, bid: bool) {
        book.apply(&MarketDataItem::new(1, LevelUpdate::new(price, qty, bid, false)));
    }

    #[test]
    fn deep_side_truncates_shallow_side_pads() {
        let mut book = OrderBook::new();
        // 70 bid levels, 3 ask levels.
        for i in 0..70 {
            apply(&mut book, 100.0 - f64::from(i), 1.0 + f64::from(i), true);
        }
        for i in 0..3 {
            apply(&mut book, 101.0 + f64::from(i), 2.0, false);
        }

        let snap = book.snapshot();
        assert_eq!(snap.bid_price[0], 100.0);
        assert_eq!(snap.bid_price[DEPTH - 1], 100.0 - (DEPTH as f64 - 1.0));
        assert_eq!(snap.ask_price[..3], [101.0, 102.0, 103.0]);
        // Independent exhaustion: asks past depth 3 stay zero even though
        // bids kept going.
        assert_eq!(snap.ask_price[3], 0.0);
        assert_eq!(snap.ask_quantity[3], 0.0);
    }

    #[test]
    fn best_levels_match_the_book() {
        let mut book = OrderBook::new();
        apply(&mut book, 99.5, 4.0, true);
        apply(&mut book, 100.5, 6.0, false);

        let snap = book.snapshot();
        assert_eq!(snap.best_bid(), book.best_bid());
        assert_eq!(snap.best_ask(), book.best_ask());
    }

    #[test]
    fn empty_book_snapshots_to_zero() {
        let snap = OrderBook::new().snapshot();
        assert_eq!(snap, BookSnapshot::default());
        assert_eq!(snap.best_bid(), PriceLevel::new(0.0, 0.0));
    }
}
