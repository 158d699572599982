//! Instrument identity: (base asset, quote asset, exchange)

use crate::{Asset, Exchange};
use std::fmt;
use thiserror::Error;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Errors produced when parsing assets, symbols or building cache paths.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    /// Ticker longer than the 8-byte packed form allows.
    #[error("ticker is too long for packed form: {ticker}")]
    TickerTooLong {
        /// The offending ticker.
        ticker: String,
    },
    /// Ticker contains non-ASCII characters.
    #[error("ticker is not ASCII: {ticker}")]
    NotAscii {
        /// The offending ticker.
        ticker: String,
    },
    /// Empty ticker.
    #[error("ticker is empty")]
    EmptyAsset,
    /// Symbol string without a `@` quote separator.
    #[error("invalid symbol format, '@' not found: {input}")]
    MissingQuote {
        /// The unparsed input.
        input: String,
    },
    /// Symbol string without an exchange and no default provided.
    #[error("invalid symbol format, exchange not specified: {input}")]
    MissingExchange {
        /// The unparsed input.
        input: String,
    },
    /// Exchange name not among the known composites.
    #[error("unknown exchange: {name}")]
    UnknownExchange {
        /// The unparsed name.
        name: String,
    },
    /// A cache path was requested for an unknown feed.
    #[error("cache path requested for unknown feed")]
    UnknownFeed,
}

/// Immutable instrument identity with canonical form
/// `{base}@{quote}.{exchange}`. 24 bytes, fixed layout, directly embeddable
/// in cache file headers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, FromZeroes, FromBytes, AsBytes)]
#[repr(C)]
pub struct Symbol {
    base: Asset,
    quote: Asset,
    exchange: Exchange,
}

impl Symbol {
    /// Assemble a symbol from already-parsed parts.
    #[must_use]
    pub const fn new(base: Asset, quote: Asset, exchange: Exchange) -> Self {
        Self {
            base,
            quote,
            exchange,
        }
    }

    /// Base asset (the ticker).
    #[must_use]
    pub const fn base(self) -> Asset {
        self.base
    }

    /// Quote asset (the class code).
    #[must_use]
    pub const fn quote(self) -> Asset {
        self.quote
    }

    /// Exchange bitmask.
    #[must_use]
    pub const fn exchange(self) -> Exchange {
        self.exchange
    }

    /// Parse the canonical `{base}@{quote}.{exchange}` form. The exchange
    /// part may be omitted when `default_exchange` is given.
    ///
    /// # Errors
    /// Fails on a missing `@` separator, an unknown exchange name, or a
    /// missing exchange with no default.
    pub fn parse(input: &str, default_exchange: Option<Exchange>) -> Result<Self, SymbolError> {
        let (base_part, rest) = input.split_once('@').ok_or_else(|| {
            SymbolError::MissingQuote {
                input: input.to_owned(),
            }
        })?;
        let (quote_part, exchange) = match rest.split_once('.') {
            Some((quote_part, exchange_name)) => {
                (quote_part, Exchange::from_name(exchange_name)?)
            }
            None => (
                rest,
                default_exchange.ok_or_else(|| SymbolError::MissingExchange {
                    input: input.to_owned(),
                })?,
            ),
        };
        Ok(Self {
            base: Asset::parse(base_part)?,
            quote: Asset::parse(quote_part)?,
            exchange,
        })
    }

    /// Exchange-native spelling of the pair, as fed to venue APIs.
    #[must_use]
    pub fn venue_symbol(self) -> String {
        match self.exchange {
            Exchange::OKEX_SWAP => format!("{}-{}-SWAP", self.base, self.quote),
            Exchange::KUCOIN_FUTURES => format!("{}{}M", self.base, self.quote),
            Exchange::KUCOIN_SPOT => format!("{}-{}", self.base, self.quote),
            _ => format!("{}{}", self.base, self.quote),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}.{}", self.base, self.quote, self.exchange)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_round_trips() {
        let symbol = Symbol::new(Asset::BTC, Asset::USDT, Exchange::BINANCE_FUTURES);
        assert_eq!(symbol.to_string(), "BTC@USDT.binance-futures");
        assert_eq!(Symbol::parse("BTC@USDT.binance-futures", None).unwrap(), symbol);
    }

    #[test]
    fn default_exchange_applies_when_omitted() {
        let symbol = Symbol::parse("ETH@USDT", Some(Exchange::OKEX_SWAP)).unwrap();
        assert_eq!(symbol.exchange(), Exchange::OKEX_SWAP);
        assert!(Symbol::parse("ETH@USDT", None).is_err());
    }

    #[test]
    fn venue_spellings() {
        let base = Asset::BTC;
        let quote = Asset::USDT;
        assert_eq!(
            Symbol::new(base, quote, Exchange::OKEX_SWAP).venue_symbol(),
            "BTC-USDT-SWAP"
        );
        assert_eq!(
            Symbol::new(base, quote, Exchange::KUCOIN_FUTURES).venue_symbol(),
            "BTCUSDTM"
        );
        assert_eq!(
            Symbol::new(base, quote, Exchange::KUCOIN_SPOT).venue_symbol(),
            "BTC-USDT"
        );
        assert_eq!(
            Symbol::new(base, quote, Exchange::BINANCE_SPOT).venue_symbol(),
            "BTCUSDT"
        );
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!(matches!(
            Symbol::parse("BTCUSDT", None),
            Err(SymbolError::MissingQuote { .. })
        ));
    }
}
