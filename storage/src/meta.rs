//! Cache file header
//!
//! Fixed 72 bytes at offset 0, always stored raw. Written as a placeholder
//! at create time and backpatched with the final item count when the writer
//! finishes; readers must never trust a header from a file still open for
//! writing.

use crate::error::CacheError;
use common::{CacheKey, Feed, Payload, Symbol, unix_millis_now};
use chrono::NaiveDate;
use std::fmt;
use std::mem::size_of;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Cache format version, 3x32-bit. Compatibility is major+minor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromZeroes, FromBytes, AsBytes)]
#[repr(C)]
pub struct Version {
    /// Breaking revision.
    pub major: i32,
    /// Compatible-extension revision.
    pub minor: i32,
    /// Build number, ignored for compatibility.
    pub build: i32,
}

impl Version {
    /// Assemble a version triple.
    #[must_use]
    pub const fn new(major: i32, minor: i32, build: i32) -> Self {
        Self {
            major,
            minor,
            build,
        }
    }

    /// Same major and minor revision.
    #[must_use]
    pub const fn is_compatible(self, other: Self) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

/// Version written by this build.
pub const FORMAT_VERSION: Version = Version::new(1, 0, 0);

/// Compression applied to the record region. The header itself is never
/// compressed. Code 3 is reserved (brotli in older tooling) and rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    /// Raw records; required for memory-mapped reads.
    None,
    /// Raw deflate stream.
    Deflate,
    /// Gzip-framed deflate stream.
    Gzip,
}

impl Compression {
    /// Integer code stored in the header.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Deflate => 1,
            Self::Gzip => 2,
        }
    }

    /// Decode a header code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Deflate),
            2 => Some(Self::Gzip),
            _ => None,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Deflate => "deflate",
            Self::Gzip => "gzip",
        };
        f.write_str(name)
    }
}

/// The on-disk header. All fields fixed-width little-endian; explicit tail
/// reserve keeps the layout padding-free.
#[derive(Clone, Copy, Debug, FromZeroes, FromBytes, AsBytes)]
#[repr(C)]
pub struct CacheMeta {
    /// Instrument identity.
    pub symbol: Symbol,
    /// Trading date as days since the unix epoch.
    pub date_days: i32,
    /// Feed code (see [`Feed::code`]).
    pub feed: i32,
    /// Compression code (see [`Compression::code`]).
    pub compression: i32,
    /// Compression level the writer used.
    pub level: i32,
    /// Number of records; authoritative only after writer finish.
    pub item_count: i64,
    /// Unix-millis timestamp of header finalization.
    pub build_time_ms: i64,
    /// Format version of the writer.
    pub version: Version,
    /// Explicit tail padding; always zero.
    pub _reserved: [u8; 4],
}

/// Size of the serialized header.
pub const META_SIZE: usize = size_of::<CacheMeta>();

impl CacheMeta {
    /// Finalized header for `key` with `item_count` records.
    #[must_use]
    pub fn new(key: CacheKey, compression: Compression, level: u32, item_count: i64) -> Self {
        Self {
            symbol: key.symbol,
            date_days: date_to_days(key.date),
            feed: key.feed.code(),
            compression: compression.code(),
            level: i32::try_from(level).unwrap_or(i32::MAX),
            item_count,
            build_time_ms: unix_millis_now(),
            version: FORMAT_VERSION,
            _reserved: [0; 4],
        }
    }

    /// Decoded feed.
    ///
    /// # Errors
    /// [`CacheError::UnknownFeedCode`] for a code this build does not know.
    pub fn feed(&self) -> Result<Feed, CacheError> {
        Feed::from_code(self.feed).ok_or(CacheError::UnknownFeedCode { code: self.feed })
    }

    /// Decoded compression.
    ///
    /// # Errors
    /// [`CacheError::UnknownCompression`] for a code this build does not know.
    pub fn compression(&self) -> Result<Compression, CacheError> {
        Compression::from_code(self.compression).ok_or(CacheError::UnknownCompression {
            code: self.compression,
        })
    }

    /// Decoded trading date.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        days_to_date(self.date_days)
    }

    /// Check this header against the key a reader was opened with. Version,
    /// feed and symbol must all agree before any record is surfaced.
    ///
    /// # Errors
    /// The matching [`CacheError`] format violation.
    pub fn validate_for<T: Payload>(&self, expected: &CacheKey) -> Result<(), CacheError> {
        if !self.version.is_compatible(FORMAT_VERSION) {
            return Err(CacheError::IncompatibleVersion {
                found: self.version,
                supported: FORMAT_VERSION,
            });
        }
        let found = self.feed()?;
        if found != T::FEED {
            return Err(CacheError::FeedMismatch {
                expected: T::FEED,
                found,
            });
        }
        if self.symbol != expected.symbol {
            return Err(CacheError::SymbolMismatch {
                expected: expected.symbol,
                found: self.symbol,
            });
        }
        Ok(())
    }
}

fn date_to_days(date: NaiveDate) -> i32 {
    let days = date
        .signed_duration_since(NaiveDate::default())
        .num_days();
    i32::try_from(days).unwrap_or(0)
}

fn days_to_date(days: i32) -> NaiveDate {
    NaiveDate::default()
        .checked_add_signed(chrono::TimeDelta::days(i64::from(days)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Asset, Exchange, LevelUpdate, Symbol, TradeUpdate};

    fn key() -> CacheKey {
        CacheKey::new(
            Symbol::new(Asset::ETH, Asset::USDT, Exchange::BINANCE_SPOT),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        )
        .with_feed(Feed::LevelUpdates)
    }

    #[test]
    fn header_is_72_bytes() {
        assert_eq!(META_SIZE, 72);
    }

    #[test]
    fn date_round_trips_through_days() {
        let meta = CacheMeta::new(key(), Compression::None, 0, 10);
        assert_eq!(meta.date(), key().date);
    }

    #[test]
    fn validation_accepts_matching_key() {
        let meta = CacheMeta::new(key(), Compression::Deflate, 6, 3);
        assert!(meta.validate_for::<LevelUpdate>(&key()).is_ok());
    }

    #[test]
    fn validation_rejects_feed_and_symbol_mismatch() {
        let meta = CacheMeta::new(key(), Compression::None, 0, 3);
        assert!(matches!(
            meta.validate_for::<TradeUpdate>(&key()),
            Err(CacheError::FeedMismatch { .. })
        ));

        let other = CacheKey::new(
            Symbol::new(Asset::BTC, Asset::USDT, Exchange::BINANCE_SPOT),
            key().date,
        )
        .with_feed(Feed::LevelUpdates);
        assert!(matches!(
            meta.validate_for::<LevelUpdate>(&other),
            Err(CacheError::SymbolMismatch { .. })
        ));
    }

    #[test]
    fn incompatible_version_is_rejected() {
        let mut meta = CacheMeta::new(key(), Compression::None, 0, 0);
        meta.version = Version::new(2, 0, 0);
        assert!(matches!(
            meta.validate_for::<LevelUpdate>(&key()),
            Err(CacheError::IncompatibleVersion { .. })
        ));
        assert!(Version::new(1, 0, 7).is_compatible(FORMAT_VERSION));
    }

    #[test]
    fn reserved_compression_code_is_unknown() {
        assert_eq!(Compression::from_code(3), None);
        for compression in [Compression::None, Compression::Deflate, Compression::Gzip] {
            assert_eq!(Compression::from_code(compression.code()), Some(compression));
        }
    }
}
