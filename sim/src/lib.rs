//! Deterministic backtest emulator
//!
//! Replays cached level updates and trades through a strategy, rebuilding
//! the book and matching the strategy's orders against it. One emulator is
//! one (symbol, date) session; determinism comes from the single-threaded
//! flush discipline, not from locks.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod emulator;
pub mod orders;
pub mod stats;
pub mod strategies;
pub mod strategy;

pub use emulator::Emulator;
pub use orders::{OrderKind, UserExecution, UserOrder};
pub use stats::{ewma, std_dev};
pub use strategies::VolumeImpulse;
pub use strategy::{OrderSink, RecordingStrategy, Strategy};
