//! Session-level matching behavior: flush discipline, touch-capped
//! executions, resting orders and end-of-stream handling.

use chrono::NaiveDate;
use common::{
    Asset, CacheKey, Exchange, LevelUpdate, MarketDataItem, Side, Symbol, TradeUpdate,
};
use lob::BookSnapshot;
use sim::{Emulator, OrderSink, RecordingStrategy, Strategy, UserExecution, UserOrder};
use std::path::Path;
use storage::{CacheWriter, Compression};
use tempfile::TempDir;

fn key() -> CacheKey {
    CacheKey::new(
        Symbol::new(Asset::BTC, Asset::USDT, Exchange::BINANCE_FUTURES),
        NaiveDate::from_ymd_opt(2023, 11, 7).unwrap(),
    )
}

fn write_levels(root: &Path, updates: &[(i64, f64, f64, bool)]) {
    let mut writer =
        CacheWriter::<LevelUpdate>::create(root, key(), Compression::None, 0).unwrap();
    for &(ts, price, qty, is_bid) in updates {
        writer.push(ts, LevelUpdate::new(price, qty, is_bid, false)).unwrap();
    }
    writer.finish().unwrap();
}

fn write_trades(root: &Path, trades: &[(i64, Side, f64, f64)]) {
    let mut writer =
        CacheWriter::<TradeUpdate>::create(root, key(), Compression::None, 0).unwrap();
    for (i, &(ts, side, price, qty)) in trades.iter().enumerate() {
        writer.push(ts, TradeUpdate::new(side, price, qty, i as i64)).unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn market_sell_executes_at_the_bid_and_empties_it() {
    let dir = TempDir::new().unwrap();
    write_levels(dir.path(), &[(1, 100.0, 5.0, true), (1, 101.0, 3.0, false)]);
    write_trades(dir.path(), &[]);

    let mut strategy = RecordingStrategy::default();
    strategy.place_on_next_snapshot(UserOrder::market(Side::Sell, 5.0, 1));

    let mut emulator = Emulator::open(dir.path(), key(), strategy).unwrap();
    emulator.run().unwrap();

    assert_eq!(emulator.book().bid_depth(), 0);
    assert_eq!(emulator.book().ask_depth(), 1);

    let strategy = emulator.into_strategy();
    assert_eq!(strategy.executions.len(), 1);
    let execution = strategy.executions[0];
    assert_eq!(execution.execution_price, 100.0);
    assert_eq!(execution.executed_quantity, 5.0);
    assert_eq!(execution.side, Side::Sell);
    assert!(strategy.finished);
}

#[test]
fn market_order_is_capped_at_the_touch_quantity() {
    let dir = TempDir::new().unwrap();
    write_levels(
        dir.path(),
        &[(1, 100.0, 5.0, true), (1, 99.0, 7.0, true), (1, 101.0, 3.0, false)],
    );
    write_trades(dir.path(), &[]);

    let mut strategy = RecordingStrategy::default();
    strategy.place_on_next_snapshot(UserOrder::market(Side::Sell, 10.0, 1));

    let mut emulator = Emulator::open(dir.path(), key(), strategy).unwrap();
    emulator.run().unwrap();

    // One execution of min(10, 5) at the touched level; the deeper 99.0
    // level is never swept.
    assert_eq!(emulator.book().bid_depth(), 1);
    let strategy = emulator.into_strategy();
    assert_eq!(strategy.executions.len(), 1);
    assert_eq!(strategy.executions[0].executed_quantity, 5.0);
    assert_eq!(strategy.executions[0].execution_price, 100.0);
}

#[test]
fn crossing_limit_buy_executes_at_the_ask() {
    let dir = TempDir::new().unwrap();
    write_levels(dir.path(), &[(1, 100.0, 5.0, true), (1, 101.0, 3.0, false)]);
    write_trades(dir.path(), &[]);

    let mut strategy = RecordingStrategy::default();
    strategy.place_on_next_snapshot(UserOrder::limit(Side::Buy, 101.0, 2.0, 1));

    let mut emulator = Emulator::open(dir.path(), key(), strategy).unwrap();
    emulator.run().unwrap();

    // The touched ask shrinks from 3 to 1.
    assert_eq!(emulator.book().best_ask().quantity, 1.0);
    let strategy = emulator.into_strategy();
    assert_eq!(strategy.executions.len(), 1);
    assert_eq!(strategy.executions[0].execution_price, 101.0);
    assert_eq!(strategy.executions[0].executed_quantity, 2.0);
}

#[test]
fn passive_limit_rests_and_is_never_matched() {
    let dir = TempDir::new().unwrap();
    write_levels(
        dir.path(),
        &[
            (1, 100.0, 5.0, true),
            (1, 101.0, 3.0, false),
            // The ask later drops through the resting buy's price.
            (2, 101.0, 0.0, false),
            (2, 98.0, 4.0, false),
        ],
    );
    write_trades(dir.path(), &[]);

    let mut strategy = RecordingStrategy::default();
    strategy.place_on_next_snapshot(UserOrder::limit(Side::Buy, 99.0, 2.0, 1));

    let mut emulator = Emulator::open(dir.path(), key(), strategy).unwrap();
    emulator.run().unwrap();

    assert_eq!(emulator.resting_orders().count(), 1);
    let resting = emulator.resting_orders().next().unwrap();
    assert_eq!(resting.price, 99.0);
    assert!(emulator.into_strategy().executions.is_empty());
}

#[test]
fn market_order_into_an_empty_side_is_dropped() {
    let dir = TempDir::new().unwrap();
    write_levels(dir.path(), &[(1, 100.0, 5.0, true)]);
    write_trades(dir.path(), &[]);

    let mut strategy = RecordingStrategy::default();
    strategy.place_on_next_snapshot(UserOrder::market(Side::Buy, 1.0, 1));

    let mut emulator = Emulator::open(dir.path(), key(), strategy).unwrap();
    emulator.run().unwrap();

    assert!(emulator.into_strategy().executions.is_empty());
}

/// Interleaving-sensitive recorder for flush-ordering assertions.
#[derive(Debug, PartialEq)]
enum Event {
    Trade(i64),
    Snapshot(i64),
    Finished,
}

#[derive(Default)]
struct SequenceStrategy {
    events: Vec<Event>,
}

impl Strategy for SequenceStrategy {
    fn order_book_updated(
        &mut self,
        _sink: &mut OrderSink,
        snapshot: MarketDataItem<BookSnapshot>,
    ) {
        self.events.push(Event::Snapshot(snapshot.timestamp));
    }

    fn trade_received(&mut self, _sink: &mut OrderSink, trade: MarketDataItem<TradeUpdate>) {
        self.events.push(Event::Trade(trade.timestamp));
    }

    fn execution_received(&mut self, _execution: UserExecution) {}

    fn simulation_finished(&mut self) {
        self.events.push(Event::Finished);
    }
}

#[test]
fn flushes_happen_on_timestamp_change_trades_first() {
    let dir = TempDir::new().unwrap();
    // Two updates share ts 1, then ts 2 arrives, then the stream ends.
    write_levels(
        dir.path(),
        &[
            (1, 100.0, 5.0, true),
            (1, 101.0, 3.0, false),
            (2, 100.0, 6.0, true),
        ],
    );
    write_trades(dir.path(), &[(1, Side::Buy, 100.5, 1.0), (2, Side::Sell, 100.0, 2.0)]);

    let mut emulator =
        Emulator::open(dir.path(), key(), SequenceStrategy::default()).unwrap();
    emulator.run().unwrap();

    assert_eq!(
        emulator.into_strategy().events,
        vec![
            // ts 1 flushed only once ts 2 arrived, trades before snapshot.
            Event::Trade(1),
            Event::Snapshot(1),
            // Final flush at end of stream covers ts 2.
            Event::Trade(2),
            Event::Snapshot(2),
            Event::Finished,
        ]
    );
}

#[test]
fn empty_session_still_finishes() {
    let dir = TempDir::new().unwrap();
    // No cache files at all: both feeds read as empty.
    let mut emulator =
        Emulator::open(dir.path(), key(), SequenceStrategy::default()).unwrap();
    emulator.run().unwrap();

    assert_eq!(emulator.into_strategy().events, vec![Event::Finished]);
}

#[test]
fn orders_placed_on_trade_callbacks_match_immediately() {
    let dir = TempDir::new().unwrap();
    write_levels(
        dir.path(),
        &[(1, 100.0, 5.0, true), (1, 101.0, 3.0, false), (2, 99.0, 1.0, true)],
    );
    write_trades(dir.path(), &[(1, Side::Sell, 100.0, 1.0)]);

    /// Sells into every trade print.
    #[derive(Default)]
    struct Chaser {
        executions: Vec<UserExecution>,
    }

    impl Strategy for Chaser {
        fn order_book_updated(
            &mut self,
            _sink: &mut OrderSink,
            _snapshot: MarketDataItem<BookSnapshot>,
        ) {
        }

        fn trade_received(&mut self, sink: &mut OrderSink, trade: MarketDataItem<TradeUpdate>) {
            sink.place(UserOrder::market(Side::Sell, 1.0, trade.timestamp));
        }

        fn execution_received(&mut self, execution: UserExecution) {
            self.executions.push(execution);
        }

        fn simulation_finished(&mut self) {}
    }

    let mut emulator = Emulator::open(dir.path(), key(), Chaser::default()).unwrap();
    emulator.run().unwrap();

    // The trade at ts 1 flushes when ts 2 arrives; the chaser's market sell
    // hits the 100.0 bid while it still holds 5 lots.
    assert_eq!(emulator.book().best_bid().quantity, 4.0);
    let strategy = emulator.into_strategy();
    assert_eq!(strategy.executions.len(), 1);
    assert_eq!(strategy.executions[0].execution_price, 100.0);
    assert_eq!(strategy.executions[0].timestamp, 1);
}
