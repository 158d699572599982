//! Exchange identifiers as a venue + market-type bitmask

use crate::symbol::SymbolError;
use std::fmt;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Bitmask combining one venue bit with one market-type bit.
///
/// Composite constants (`BINANCE_FUTURES`, ...) are the values that actually
/// appear in symbols and cache paths; the primitive bits exist so venue and
/// market type can be tested independently.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromZeroes, FromBytes, AsBytes,
)]
#[repr(transparent)]
pub struct Exchange(u64);

impl Exchange {
    /// No exchange.
    pub const NONE: Self = Self(0);
    /// Spot market type.
    pub const SPOT: Self = Self(1);
    /// Futures market type.
    pub const FUTURES: Self = Self(1 << 1);
    /// Currency market type.
    pub const CURRENCY: Self = Self(1 << 2);
    /// Perpetual swap market type.
    pub const SWAP: Self = Self(1 << 3);
    /// Binance venue.
    pub const BINANCE: Self = Self(1 << 4);
    /// Okex venue.
    pub const OKEX: Self = Self(1 << 5);
    /// Moscow exchange venue.
    pub const MOEX: Self = Self(1 << 6);
    /// Kucoin venue.
    pub const KUCOIN: Self = Self(1 << 7);

    /// Binance spot.
    pub const BINANCE_SPOT: Self = Self(Self::BINANCE.0 | Self::SPOT.0);
    /// Binance USD-margined futures.
    pub const BINANCE_FUTURES: Self = Self(Self::BINANCE.0 | Self::FUTURES.0);
    /// Okex spot.
    pub const OKEX_SPOT: Self = Self(Self::OKEX.0 | Self::SPOT.0);
    /// Okex futures.
    pub const OKEX_FUTURES: Self = Self(Self::OKEX.0 | Self::FUTURES.0);
    /// Okex perpetual swap.
    pub const OKEX_SWAP: Self = Self(Self::OKEX.0 | Self::SWAP.0);
    /// Moex derivatives section.
    pub const MOEX_FUTURES: Self = Self(Self::MOEX.0 | Self::FUTURES.0);
    /// Moex equities section.
    pub const MOEX_SPOT: Self = Self(Self::MOEX.0 | Self::SPOT.0);
    /// Moex currency section.
    pub const MOEX_SELT: Self = Self(Self::MOEX.0 | Self::CURRENCY.0);
    /// Kucoin spot.
    pub const KUCOIN_SPOT: Self = Self(Self::KUCOIN.0 | Self::SPOT.0);
    /// Kucoin futures.
    pub const KUCOIN_FUTURES: Self = Self(Self::KUCOIN.0 | Self::FUTURES.0);

    const NAMED: &'static [(Exchange, &'static str)] = &[
        (Self::BINANCE_SPOT, "binance"),
        (Self::BINANCE_FUTURES, "binance-futures"),
        (Self::OKEX_SPOT, "okex"),
        (Self::OKEX_FUTURES, "okex-futures"),
        (Self::OKEX_SWAP, "okex-swap"),
        (Self::MOEX_FUTURES, "moex-futures"),
        (Self::MOEX_SPOT, "moex-spot"),
        (Self::MOEX_SELT, "moex-selt"),
        (Self::KUCOIN_SPOT, "kucoin"),
        (Self::KUCOIN_FUTURES, "kucoin-futures"),
    ];

    /// Raw bitmask value.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Whether every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the venue is a crypto exchange.
    #[must_use]
    pub const fn is_crypto(self) -> bool {
        self.0 & (Self::BINANCE.0 | Self::OKEX.0 | Self::KUCOIN.0) != 0
    }

    /// Canonical lowercase name for a known composite, used in cache paths.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(exchange, _)| *exchange == self)
            .map(|(_, name)| *name)
    }

    /// Parse a canonical composite name produced by [`Exchange::name`].
    ///
    /// # Errors
    /// Fails when the name is not one of the known composites.
    pub fn from_name(name: &str) -> Result<Self, SymbolError> {
        Self::NAMED
            .iter()
            .find(|(_, known)| *known == name)
            .map(|(exchange, _)| *exchange)
            .ok_or_else(|| SymbolError::UnknownExchange {
                name: name.to_owned(),
            })
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "exchange-{:#x}", self.0),
        }
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exchange({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composites_carry_their_bits() {
        assert!(Exchange::BINANCE_FUTURES.contains(Exchange::BINANCE));
        assert!(Exchange::BINANCE_FUTURES.contains(Exchange::FUTURES));
        assert!(!Exchange::BINANCE_FUTURES.contains(Exchange::SPOT));
    }

    #[test]
    fn names_round_trip() {
        for (exchange, name) in Exchange::NAMED {
            assert_eq!(exchange.name(), Some(*name));
            assert_eq!(Exchange::from_name(name).unwrap(), *exchange);
        }
        assert!(Exchange::from_name("nyse").is_err());
    }

    #[test]
    fn crypto_classification() {
        assert!(Exchange::BINANCE_FUTURES.is_crypto());
        assert!(Exchange::KUCOIN_SPOT.is_crypto());
        assert!(!Exchange::MOEX_FUTURES.is_crypto());
    }
}
