//! Raw fixed-size record codec
//!
//! Records are written as exactly `size_of::<T>()` bytes with no framing;
//! a timestamped record is an 8-byte little-endian unix-millis timestamp
//! followed immediately by the payload bytes. Short reads are retried until
//! the stream either furnishes the full record or reports a clean EOF at a
//! record boundary; anything else is corruption, never silent truncation.

use crate::error::CacheError;
use common::{MarketDataItem, Payload};
use std::io::{self, Read, Write};
use std::mem::size_of;
use zerocopy::{AsBytes, FromBytes};

/// Structural precondition for raw reinterpretation: a fixed-size value
/// type with no indirection and a byte-stable layout.
pub trait Record: AsBytes + FromBytes + Copy {}

impl<T: AsBytes + FromBytes + Copy> Record for T {}

/// On-disk size of one timestamped record of payload `T`.
#[must_use]
pub const fn record_size<T: Payload>() -> usize {
    size_of::<i64>() + size_of::<T>()
}

/// Write a bare fixed-size value as raw bytes.
///
/// # Errors
/// Propagates the underlying write failure.
pub fn write_struct<T: Record>(writer: &mut impl Write, value: &T) -> io::Result<()> {
    writer.write_all(value.as_bytes())
}

/// Read a bare fixed-size value, `None` on clean EOF before any byte.
///
/// # Errors
/// [`CacheError::ShortRead`] when the stream ends inside the value.
pub fn read_struct<T: Record>(reader: &mut impl Read) -> Result<Option<T>, CacheError> {
    let mut buf = vec![0u8; size_of::<T>()];
    if !read_exact_or_eof(reader, &mut buf)? {
        return Ok(None);
    }
    T::read_from(buf.as_slice())
        .map(Some)
        .ok_or(CacheError::BadHeader)
}

/// Append one timestamped record.
///
/// # Errors
/// Propagates the underlying write failure.
pub fn write_record<T: Payload>(
    writer: &mut impl Write,
    item: &MarketDataItem<T>,
) -> io::Result<()> {
    writer.write_all(&item.timestamp.to_le_bytes())?;
    writer.write_all(item.payload.as_bytes())
}

/// Read one timestamped record, `None` on clean EOF at a record boundary.
/// `scratch` is reused across calls to keep the hot loop allocation-free.
///
/// # Errors
/// [`CacheError::ShortRead`] when the stream ends mid-record.
pub fn read_record<T: Payload>(
    reader: &mut impl Read,
    scratch: &mut Vec<u8>,
) -> Result<Option<MarketDataItem<T>>, CacheError> {
    scratch.resize(record_size::<T>(), 0);
    if !read_exact_or_eof(reader, scratch)? {
        return Ok(None);
    }
    decode_record(scratch).map(Some)
}

/// Reinterpret one record's bytes: timestamp prefix + payload.
///
/// # Errors
/// [`CacheError::ShortRead`] when the slice is shorter than a record.
pub fn decode_record<T: Payload>(bytes: &[u8]) -> Result<MarketDataItem<T>, CacheError> {
    let short = || CacheError::ShortRead {
        expected: record_size::<T>(),
        got: bytes.len(),
    };
    let (ts_bytes, payload_bytes) = bytes.split_at_checked(size_of::<i64>()).ok_or_else(short)?;
    let timestamp = i64::from_le_bytes(ts_bytes.try_into().map_err(|_| short())?);
    let payload = T::read_from(payload_bytes).ok_or_else(short)?;
    Ok(MarketDataItem::new(timestamp, payload))
}

/// Fill `buf` completely, retrying short reads. `Ok(false)` means the stream
/// was already exhausted (no bytes at all); a partial fill is an error.
fn read_exact_or_eof(reader: &mut impl Read, buf: &mut [u8]) -> Result<bool, CacheError> {
    let mut got = 0;
    while got < buf.len() {
        match reader.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    if got == 0 {
        Ok(false)
    } else if got == buf.len() {
        Ok(true)
    } else {
        Err(CacheError::ShortRead {
            expected: buf.len(),
            got,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{LevelUpdate, Side, TradeUpdate};
    use std::io::Cursor;

    #[test]
    fn record_round_trip() {
        let item = MarketDataItem::new(1_699_000_000_123, LevelUpdate::new(100.5, 3.0, true, false));
        let mut buf = Vec::new();
        write_record(&mut buf, &item).unwrap();
        assert_eq!(buf.len(), record_size::<LevelUpdate>());

        let mut scratch = Vec::new();
        let read = read_record::<LevelUpdate>(&mut Cursor::new(&buf), &mut scratch)
            .unwrap()
            .unwrap();
        assert_eq!(read, item);
    }

    #[test]
    fn clean_eof_is_none() {
        let mut scratch = Vec::new();
        let read = read_record::<TradeUpdate>(&mut Cursor::new(&[]), &mut scratch).unwrap();
        assert!(read.is_none());
    }

    #[test]
    fn partial_final_record_is_corruption() {
        let item = MarketDataItem::new(1, TradeUpdate::new(Side::Buy, 10.0, 1.0, 5));
        let mut buf = Vec::new();
        write_record(&mut buf, &item).unwrap();
        buf.truncate(buf.len() - 3);

        let mut scratch = Vec::new();
        let err = read_record::<TradeUpdate>(&mut Cursor::new(&buf), &mut scratch).unwrap_err();
        assert!(matches!(err, CacheError::ShortRead { .. }));
    }

    /// Reader that returns one byte at a time, exercising the retry loop.
    struct Dribble<'a>(&'a [u8]);

    impl Read for Dribble<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    #[test]
    fn short_reads_are_retried() {
        let item = MarketDataItem::new(42, TradeUpdate::new(Side::Sell, 9.5, 4.0, 1));
        let mut buf = Vec::new();
        write_record(&mut buf, &item).unwrap();

        let mut scratch = Vec::new();
        let read = read_record::<TradeUpdate>(&mut Dribble(&buf), &mut scratch)
            .unwrap()
            .unwrap();
        assert_eq!(read, item);
    }
}
