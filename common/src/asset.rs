//! Interned ticker identifiers packed into a fixed-width integer

use crate::symbol::SymbolError;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::{LazyLock, RwLock};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Maximum ticker length in ASCII bytes.
pub const MAX_TICKER_LEN: usize = 8;

/// Process-wide id -> name registry. Entries are inserted lazily and never
/// removed, so leaking the backing strings is sound and gives out
/// `&'static str` without refcounting.
static ASSET_NAMES: LazyLock<RwLock<FxHashMap<u64, &'static str>>> =
    LazyLock::new(|| RwLock::new(FxHashMap::default()));

/// A short (<= 8 ASCII characters) ticker packed little-endian into a `u64`,
/// NUL-padded. Equality and hashing are integer operations.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromZeroes, FromBytes, AsBytes,
)]
#[repr(transparent)]
pub struct Asset(u64);

impl Asset {
    /// Tether USD stablecoin.
    pub const USDT: Self = Self(pack_const("USDT"));
    /// US dollar.
    pub const USD: Self = Self(pack_const("USD"));
    /// Bitcoin.
    pub const BTC: Self = Self(pack_const("BTC"));
    /// Ether.
    pub const ETH: Self = Self(pack_const("ETH"));
    /// Binance coin.
    pub const BNB: Self = Self(pack_const("BNB"));

    /// Parse a ticker string into its packed form.
    ///
    /// # Errors
    /// Fails on empty, non-ASCII or longer-than-8-byte input.
    pub fn parse(ticker: &str) -> Result<Self, SymbolError> {
        let bytes = ticker.as_bytes();
        if bytes.is_empty() {
            return Err(SymbolError::EmptyAsset);
        }
        if bytes.len() > MAX_TICKER_LEN {
            return Err(SymbolError::TickerTooLong {
                ticker: ticker.to_owned(),
            });
        }
        if !ticker.is_ascii() {
            return Err(SymbolError::NotAscii {
                ticker: ticker.to_owned(),
            });
        }
        let mut packed = [0u8; MAX_TICKER_LEN];
        packed[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(u64::from_le_bytes(packed)))
    }

    /// The packed integer representation.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Decode the ticker, interning the decoded string on first use.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        if let Some(&name) = ASSET_NAMES
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&self.0)
        {
            return name;
        }
        let decoded = decode(self.0);
        let mut names = ASSET_NAMES
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *names
            .entry(self.0)
            .or_insert_with(|| Box::leak(decoded.into_boxed_str()))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({})", self.as_str())
    }
}

fn decode(raw: u64) -> String {
    let bytes = raw.to_le_bytes();
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(MAX_TICKER_LEN);
    String::from_utf8_lossy(&bytes[..len]).into_owned()
}

const fn pack_const(ticker: &str) -> u64 {
    let bytes = ticker.as_bytes();
    assert!(bytes.len() <= MAX_TICKER_LEN, "ticker is too long");
    let mut packed = [0u8; MAX_TICKER_LEN];
    let mut i = 0;
    while i < bytes.len() {
        packed[i] = bytes[i];
        i += 1;
    }
    u64::from_le_bytes(packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips() {
        let asset = Asset::parse("SPBFUT").unwrap();
        assert_eq!(asset.as_str(), "SPBFUT");
        assert_eq!(asset, Asset::parse("SPBFUT").unwrap());
    }

    #[test]
    fn well_known_constants_decode() {
        assert_eq!(Asset::USDT.as_str(), "USDT");
        assert_eq!(Asset::BTC.as_str(), "BTC");
    }

    #[test]
    fn rejects_long_and_non_ascii() {
        assert!(Asset::parse("TOOLONGTICKER").is_err());
        assert!(Asset::parse("BTС").is_err()); // cyrillic С
        assert!(Asset::parse("").is_err());
    }

    #[test]
    fn distinct_tickers_distinct_ids() {
        assert_ne!(Asset::parse("BTC").unwrap(), Asset::parse("BTCX").unwrap());
    }
}
