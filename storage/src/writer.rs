//! Cache file writer with two-phase header commit
//!
//! A new file is created with a placeholder header, records stream in behind
//! it, and only [`CacheWriter::finish`] backpatches the header with the real
//! record count. A crash mid-write therefore leaves a file whose header
//! declares more records than the body holds, which readers surface as
//! [`CacheError::MissingRecords`] instead of silently truncated data.

use crate::codec;
use crate::error::CacheError;
use crate::meta::{CacheMeta, Compression, META_SIZE};
use common::{CacheKey, MarketDataItem, Payload};
use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::Compression as Flate2Level;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug)]
enum RecordSink {
    Plain(BufWriter<File>),
    Deflate(DeflateEncoder<BufWriter<File>>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl RecordSink {
    fn finish(self) -> io::Result<BufWriter<File>> {
        match self {
            Self::Plain(w) => Ok(w),
            Self::Deflate(enc) => enc.finish(),
            Self::Gzip(enc) => enc.finish(),
        }
    }
}

impl Write for RecordSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Deflate(enc) => enc.write(buf),
            Self::Gzip(enc) => enc.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Deflate(enc) => enc.flush(),
            Self::Gzip(enc) => enc.flush(),
        }
    }
}

/// Streaming writer for one cache file. Never overwrites an existing file
/// and never leaves a valid header behind unless `finish` ran to completion.
#[derive(Debug)]
pub struct CacheWriter<T: Payload> {
    key: CacheKey,
    path: PathBuf,
    compression: Compression,
    level: u32,
    item_count: i64,
    sink: Option<RecordSink>,
    _payload: PhantomData<T>,
}

impl<T: Payload> CacheWriter<T> {
    /// Create the cache file for `key` under `root`, including missing
    /// parent directories.
    ///
    /// # Errors
    /// [`CacheError::AlreadyExists`] when the target file is present, or the
    /// underlying I/O failure.
    pub fn create(
        root: impl AsRef<Path>,
        key: CacheKey,
        compression: Compression,
        level: u32,
    ) -> Result<Self, CacheError> {
        let key = key.with_feed(T::FEED);
        let path = key.file_path(root.as_ref())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(CacheError::AlreadyExists { path });
            }
            Err(e) => return Err(e.into()),
        };

        // Reserve the header region; the real header lands on finish.
        let mut buf = BufWriter::new(file);
        buf.write_all(&[0u8; META_SIZE])?;

        let sink = match compression {
            Compression::None => RecordSink::Plain(buf),
            Compression::Deflate => {
                RecordSink::Deflate(DeflateEncoder::new(buf, Flate2Level::new(level)))
            }
            Compression::Gzip => RecordSink::Gzip(GzEncoder::new(buf, Flate2Level::new(level))),
        };
        debug!(key = %key, %compression, level, "cache writer opened");
        Ok(Self {
            key,
            path,
            compression,
            level,
            item_count: 0,
            sink: Some(sink),
            _payload: PhantomData,
        })
    }

    /// Key the writer was opened with, feed already resolved.
    #[must_use]
    pub const fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Path of the file being written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written so far.
    #[must_use]
    pub const fn item_count(&self) -> i64 {
        self.item_count
    }

    /// Append one record. Records must arrive in non-decreasing timestamp
    /// order; the writer does not reorder.
    ///
    /// # Errors
    /// The underlying write failure.
    pub fn write(&mut self, item: &MarketDataItem<T>) -> Result<(), CacheError> {
        let sink = self.sink.as_mut().ok_or_else(already_finished)?;
        codec::write_record(sink, item)?;
        self.item_count += 1;
        Ok(())
    }

    /// Append a timestamp/payload pair without building the item first.
    ///
    /// # Errors
    /// The underlying write failure.
    pub fn push(&mut self, timestamp: i64, payload: T) -> Result<(), CacheError> {
        self.write(&MarketDataItem::new(timestamp, payload))
    }

    /// Flush the compressor and backpatch the header, committing the file.
    /// A writer dropped without `finish` leaves the placeholder header in
    /// place and the file unreadable by design.
    ///
    /// # Errors
    /// The underlying flush/seek/write failure.
    pub fn finish(mut self) -> Result<CacheMeta, CacheError> {
        let sink = self.sink.take().ok_or_else(already_finished)?;
        let buf = sink.finish()?;
        let mut file = buf.into_inner().map_err(io::IntoInnerError::into_error)?;

        let meta = CacheMeta::new(self.key, self.compression, self.level, self.item_count);
        file.seek(SeekFrom::Start(0))?;
        codec::write_struct(&mut file, &meta)?;
        file.sync_all()?;
        debug!(key = %self.key, items = self.item_count, "cache writer finished");
        Ok(meta)
    }

}

impl<T: Payload> Drop for CacheWriter<T> {
    fn drop(&mut self) {
        if self.sink.is_some() {
            warn!(
                key = %self.key,
                path = %self.path.display(),
                "cache writer dropped without finish, file left uncommitted"
            );
        }
    }
}

fn already_finished() -> CacheError {
    CacheError::Io(io::Error::other("cache writer already finished"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::read_struct;
    use chrono::NaiveDate;
    use common::{Asset, Exchange, Feed, Symbol, TradeUpdate};
    use std::io::Read;
    use tempfile::TempDir;

    fn key() -> CacheKey {
        CacheKey::new(
            Symbol::new(Asset::BTC, Asset::USDT, Exchange::BINANCE_FUTURES),
            NaiveDate::from_ymd_opt(2023, 11, 7).unwrap(),
        )
    }

    #[test]
    fn finish_backpatches_the_header() {
        let dir = TempDir::new().unwrap();
        let mut writer =
            CacheWriter::<TradeUpdate>::create(dir.path(), key(), Compression::None, 0).unwrap();
        for i in 0..5 {
            writer
                .push(1_000 + i, TradeUpdate::new(common::Side::Buy, 100.0, 1.0, i))
                .unwrap();
        }
        let path = writer.path().to_path_buf();
        let meta = writer.finish().unwrap();
        assert_eq!(meta.item_count, 5);
        assert_eq!(meta.feed().unwrap(), Feed::Trades);

        let mut file = File::open(path).unwrap();
        let on_disk: CacheMeta = read_struct(&mut file).unwrap().unwrap();
        assert_eq!(on_disk.item_count, 5);
        assert_eq!(on_disk.symbol, key().symbol);
    }

    #[test]
    fn existing_file_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let writer =
            CacheWriter::<TradeUpdate>::create(dir.path(), key(), Compression::None, 0).unwrap();
        writer.finish().unwrap();

        let err =
            CacheWriter::<TradeUpdate>::create(dir.path(), key(), Compression::None, 0).unwrap_err();
        assert!(matches!(err, CacheError::AlreadyExists { .. }));
    }

    #[test]
    fn unfinished_writer_leaves_placeholder_header() {
        let dir = TempDir::new().unwrap();
        let path;
        {
            let mut writer =
                CacheWriter::<TradeUpdate>::create(dir.path(), key(), Compression::Gzip, 5)
                    .unwrap();
            writer
                .push(1, TradeUpdate::new(common::Side::Sell, 99.0, 2.0, 7))
                .unwrap();
            path = writer.path().to_path_buf();
            // dropped without finish
        }
        let mut header = vec![0u8; META_SIZE];
        File::open(path).unwrap().read_exact(&mut header).unwrap();
        assert!(header.iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_record_file_commits_cleanly() {
        let dir = TempDir::new().unwrap();
        let writer =
            CacheWriter::<TradeUpdate>::create(dir.path(), key(), Compression::Deflate, 6).unwrap();
        let meta = writer.finish().unwrap();
        assert_eq!(meta.item_count, 0);
        assert_eq!(meta.compression().unwrap(), Compression::Deflate);
    }
}
