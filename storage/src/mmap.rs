//! Zero-copy reads over uncompressed cache files
//!
//! The whole file is mapped once and every access decodes straight from the
//! mapping, so repeated replays of the same day pay no decompression or
//! buffer-copy cost. Only [`Compression::None`] files qualify; the file
//! length is checked against the header-declared record count at open time,
//! which makes every later offset access in-bounds by construction.

use crate::codec::{decode_record, record_size};
use crate::error::CacheError;
use crate::meta::{CacheMeta, Compression, META_SIZE};
use crate::reader::CacheRecords;
use common::{CacheKey, MarketDataItem, Payload};
use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use zerocopy::FromBytes;

/// Random-access reader over one uncompressed cache file.
#[derive(Debug)]
pub struct MappedReader<T: Payload> {
    key: CacheKey,
    path: PathBuf,
    /// `None` when the file does not exist.
    map: Option<Mmap>,
    item_count: i64,
    cursor: i64,
    _payload: std::marker::PhantomData<T>,
}

impl<T: Payload> MappedReader<T> {
    /// Map the cache for `key` under `root`. A missing file yields an empty
    /// reader; compressed files are rejected with
    /// [`CacheError::CompressedMap`].
    ///
    /// # Errors
    /// Header validation, length validation or I/O failure.
    pub fn open(root: impl AsRef<Path>, key: CacheKey) -> Result<Self, CacheError> {
        let key = key.with_feed(T::FEED);
        let path = key.file_path(root.as_ref())?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(key = %key, "cache file absent, mapping as empty");
                return Ok(Self {
                    key,
                    path,
                    map: None,
                    item_count: 0,
                    cursor: 0,
                    _payload: std::marker::PhantomData,
                });
            }
            Err(e) => return Err(e.into()),
        };

        #[allow(unsafe_code)]
        // The mapping is read-only and the file is a finished cache, which
        // is never rewritten in place.
        let map = unsafe { Mmap::map(&file)? };

        let meta = CacheMeta::read_from_prefix(&map[..]).ok_or(CacheError::BadHeader)?;
        meta.validate_for::<T>(&key)?;
        let compression = meta.compression()?;
        if compression != Compression::None {
            return Err(CacheError::CompressedMap { compression });
        }

        let count = u64::try_from(meta.item_count).map_err(|_| CacheError::BadHeader)?;
        let needed = META_SIZE as u64 + count * record_size::<T>() as u64;
        let actual = map.len() as u64;
        if needed > actual {
            return Err(CacheError::Truncated { needed, actual });
        }

        Ok(Self {
            key,
            path,
            map: Some(map),
            item_count: meta.item_count,
            cursor: 0,
            _payload: std::marker::PhantomData,
        })
    }

    /// Path the reader resolved, whether or not the file exists.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the record at `index` without moving the cursor.
    #[must_use]
    pub fn get(&self, index: i64) -> Option<MarketDataItem<T>> {
        if index < 0 || index >= self.item_count {
            return None;
        }
        let map = self.map.as_ref()?;
        let size = record_size::<T>();
        #[allow(clippy::cast_sign_loss)] // bounds checked above
        let offset = META_SIZE + index as usize * size;
        // Infallible: open() proved the mapping covers item_count records.
        decode_record(&map[offset..offset + size]).ok()
    }
}

impl<T: Payload> CacheRecords<T> for MappedReader<T> {
    fn key(&self) -> &CacheKey {
        &self.key
    }

    fn item_count(&self) -> i64 {
        self.item_count
    }

    fn peek_timestamp(&mut self) -> Option<i64> {
        self.get(self.cursor).map(|item| item.timestamp)
    }

    fn next_record(&mut self) -> Result<Option<MarketDataItem<T>>, CacheError> {
        match self.get(self.cursor) {
            Some(item) => {
                self.cursor += 1;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) -> Result<(), CacheError> {
        self.cursor = 0;
        Ok(())
    }
}
