//! Streaming cache reader with one-record lookahead
//!
//! The reader always holds the next undelivered record (or the error that
//! producing it raised), so `peek_timestamp` is free and time-ordered merges
//! across feeds never consume a record early. A missing file is a valid
//! empty cache; a present file that violates the format is an error, never
//! an empty result.

use crate::codec::{self, read_struct};
use crate::error::CacheError;
use crate::meta::{CacheMeta, Compression, META_SIZE};
use common::{CacheKey, MarketDataItem, Payload};
use flate2::read::{DeflateDecoder, GzDecoder};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug)]
enum RecordStream {
    Plain(BufReader<File>),
    Deflate(DeflateDecoder<BufReader<File>>),
    Gzip(GzDecoder<BufReader<File>>),
}

impl RecordStream {
    fn wrap(file: File, compression: Compression) -> Self {
        let buf = BufReader::new(file);
        match compression {
            Compression::None => Self::Plain(buf),
            Compression::Deflate => Self::Deflate(DeflateDecoder::new(buf)),
            Compression::Gzip => Self::Gzip(GzDecoder::new(buf)),
        }
    }
}

impl Read for RecordStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(r) => r.read(buf),
            Self::Deflate(r) => r.read(buf),
            Self::Gzip(r) => r.read(buf),
        }
    }
}

/// Ordered access to one cache file's records. Implemented by the streaming
/// [`CacheReader`] and the zero-copy [`crate::MappedReader`].
pub trait CacheRecords<T: Payload> {
    /// Key the reader was opened with, feed resolved.
    fn key(&self) -> &CacheKey;

    /// Record count the header declares; `0` for a missing file.
    fn item_count(&self) -> i64;

    /// True when the cache holds no records, including the missing-file case.
    fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Timestamp of the next record without consuming it; `None` when the
    /// stream is exhausted. A pending read error reports `i64::MIN` so that
    /// bounded iteration still surfaces it.
    fn peek_timestamp(&mut self) -> Option<i64>;

    /// Deliver the next record. `Ok(None)` is clean exhaustion.
    ///
    /// # Errors
    /// Any [`CacheError`] raised producing the record.
    fn next_record(&mut self) -> Result<Option<MarketDataItem<T>>, CacheError>;

    /// Rewind to the first record.
    ///
    /// # Errors
    /// The underlying reopen/seek failure.
    fn reset(&mut self) -> Result<(), CacheError>;

    /// Iterate records with timestamp `<= until` (inclusive); `None` reads
    /// to the end of the stream. The cursor stays where iteration stops, so
    /// successive calls with increasing bounds replay a session in slices.
    fn continue_read_until(&mut self, until: Option<i64>) -> ReadUntil<'_, T, Self>
    where
        Self: Sized,
    {
        ReadUntil {
            source: self,
            until,
            _payload: PhantomData,
        }
    }
}

/// Bounded record iteration, see [`CacheRecords::continue_read_until`].
pub struct ReadUntil<'a, T: Payload, R: CacheRecords<T>> {
    source: &'a mut R,
    until: Option<i64>,
    _payload: PhantomData<T>,
}

impl<T: Payload, R: CacheRecords<T>> Iterator for ReadUntil<'_, T, R> {
    type Item = Result<MarketDataItem<T>, CacheError>;

    fn next(&mut self) -> Option<Self::Item> {
        let timestamp = self.source.peek_timestamp()?;
        if let Some(until) = self.until {
            if timestamp > until {
                return None;
            }
        }
        match self.source.next_record() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Sequential reader over one cache file, decompressing on the fly.
#[derive(Debug)]
pub struct CacheReader<T: Payload> {
    key: CacheKey,
    path: PathBuf,
    /// `None` when the file does not exist.
    compression: Option<Compression>,
    item_count: i64,
    /// Records pulled off the stream so far, lookahead included.
    pulled: i64,
    next: Option<Result<MarketDataItem<T>, CacheError>>,
    stream: Option<RecordStream>,
    scratch: Vec<u8>,
}

impl<T: Payload> CacheReader<T> {
    /// Open the cache for `key` under `root`. A missing file yields an
    /// empty reader; a malformed or mismatched file is an error.
    ///
    /// # Errors
    /// Header validation or I/O failure.
    pub fn open(root: impl AsRef<Path>, key: CacheKey) -> Result<Self, CacheError> {
        let key = key.with_feed(T::FEED);
        let path = key.file_path(root.as_ref())?;
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(key = %key, "cache file absent, reading as empty");
                return Ok(Self {
                    key,
                    path,
                    compression: None,
                    item_count: 0,
                    pulled: 0,
                    next: None,
                    stream: None,
                    scratch: Vec::new(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let meta: CacheMeta = match read_struct(&mut file) {
            Ok(Some(meta)) => meta,
            Ok(None) | Err(CacheError::ShortRead { .. }) => return Err(CacheError::BadHeader),
            Err(e) => return Err(e),
        };
        meta.validate_for::<T>(&key)?;
        let compression = meta.compression()?;

        let mut reader = Self {
            key,
            path,
            compression: Some(compression),
            item_count: meta.item_count,
            pulled: 0,
            next: None,
            stream: Some(RecordStream::wrap(file, compression)),
            scratch: Vec::new(),
        };
        reader.fill();
        Ok(reader)
    }

    /// Path the reader resolved, whether or not the file exists.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Compression of the open file; `None` for a missing file.
    #[must_use]
    pub const fn compression(&self) -> Option<Compression> {
        self.compression
    }

    fn fill(&mut self) {
        let Some(stream) = self.stream.as_mut() else {
            self.next = None;
            return;
        };
        self.next = match codec::read_record::<T>(stream, &mut self.scratch) {
            Ok(Some(item)) => {
                self.pulled += 1;
                Some(Ok(item))
            }
            Ok(None) if self.pulled < self.item_count => Some(Err(CacheError::MissingRecords {
                expected: self.item_count,
                read: self.pulled,
            })),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        };
    }
}

impl<T: Payload> CacheRecords<T> for CacheReader<T> {
    fn key(&self) -> &CacheKey {
        &self.key
    }

    fn item_count(&self) -> i64 {
        self.item_count
    }

    fn peek_timestamp(&mut self) -> Option<i64> {
        match &self.next {
            Some(Ok(item)) => Some(item.timestamp),
            Some(Err(_)) => Some(i64::MIN),
            None => None,
        }
    }

    fn next_record(&mut self) -> Result<Option<MarketDataItem<T>>, CacheError> {
        match self.next.take() {
            Some(Ok(item)) => {
                self.fill();
                Ok(Some(item))
            }
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    fn reset(&mut self) -> Result<(), CacheError> {
        let Some(compression) = self.compression else {
            return Ok(());
        };
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(META_SIZE as u64))?;
        self.stream = Some(RecordStream::wrap(file, compression));
        self.pulled = 0;
        self.fill();
        Ok(())
    }
}
