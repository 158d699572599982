//! Limit order book reconstructed from level updates
//!
//! The book is an aggregate-by-level view: each side maps price to total
//! resting quantity, rebuilt by replaying [`common::LevelUpdate`] records.
//! Snapshots are fixed-depth copies cheap enough to take per flush.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod book;
pub mod snapshot;

pub use book::{OrderBook, PriceLevel};
pub use snapshot::{BookSnapshot, DEPTH};
