//! Re-encode an existing cache file under a different compression

use crate::error::CacheError;
use crate::meta::Compression;
use crate::reader::{CacheReader, CacheRecords};
use crate::writer::CacheWriter;
use common::{CacheKey, Payload};
use std::path::Path;
use tracing::info;

/// Stream every record of the cache at (`src_root`, `key`) into a new file
/// under `dst_root` with the given compression. The source is left intact;
/// recompressing a missing source produces an empty but valid destination.
///
/// # Errors
/// [`CacheError::SameRoot`] when both roots resolve to the same directory,
/// any source format violation, or the destination write failure.
pub fn recompress<T: Payload>(
    src_root: impl AsRef<Path>,
    dst_root: impl AsRef<Path>,
    key: CacheKey,
    compression: Compression,
    level: u32,
) -> Result<i64, CacheError> {
    let (src_root, dst_root) = (src_root.as_ref(), dst_root.as_ref());
    if same_root(src_root, dst_root) {
        return Err(CacheError::SameRoot);
    }

    let mut reader = CacheReader::<T>::open(src_root, key)?;
    let mut writer = CacheWriter::<T>::create(dst_root, key, compression, level)?;
    while let Some(item) = reader.next_record()? {
        writer.write(&item)?;
    }
    let meta = writer.finish()?;
    info!(
        key = %reader.key(),
        items = meta.item_count,
        %compression,
        "cache recompressed"
    );
    Ok(meta.item_count)
}

fn same_root(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::META_SIZE;
    use chrono::NaiveDate;
    use common::{Asset, Exchange, Feed, Side, Symbol, TradeUpdate};
    use tempfile::TempDir;

    fn key() -> CacheKey {
        CacheKey::new(
            Symbol::new(Asset::BTC, Asset::USDT, Exchange::BINANCE_SPOT),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
    }

    #[test]
    fn deflate_round_trips_through_raw() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();

        let mut writer =
            CacheWriter::<TradeUpdate>::create(src.path(), key(), Compression::Deflate, 9).unwrap();
        for i in 0..100 {
            writer
                .push(i, TradeUpdate::new(Side::Buy, 50_000.0, 0.5, i))
                .unwrap();
        }
        writer.finish().unwrap();

        let copied =
            recompress::<TradeUpdate>(src.path(), dst.path(), key(), Compression::None, 0)
                .unwrap();
        assert_eq!(copied, 100);

        let mut reader = CacheReader::<TradeUpdate>::open(dst.path(), key()).unwrap();
        assert_eq!(reader.item_count(), 100);
        let mut read = 0;
        while let Some(item) = reader.next_record().unwrap() {
            assert_eq!(item.timestamp, read);
            read += 1;
        }
        assert_eq!(read, 100);

        // Raw output has the exact derivable size.
        let path = key()
            .with_feed(Feed::Trades)
            .file_path(dst.path())
            .unwrap();
        let expected = META_SIZE as u64 + 100 * crate::codec::record_size::<TradeUpdate>() as u64;
        assert_eq!(std::fs::metadata(path).unwrap().len(), expected);
    }

    #[test]
    fn identical_roots_are_rejected() {
        let dir = TempDir::new().unwrap();
        let err = recompress::<TradeUpdate>(
            dir.path(),
            dir.path(),
            key(),
            Compression::Gzip,
            6,
        )
        .unwrap_err();
        assert!(matches!(err, CacheError::SameRoot));
    }

    #[test]
    fn missing_source_yields_empty_destination() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let copied =
            recompress::<TradeUpdate>(src.path(), dst.path(), key(), Compression::Gzip, 6)
                .unwrap();
        assert_eq!(copied, 0);

        let reader = CacheReader::<TradeUpdate>::open(dst.path(), key()).unwrap();
        assert!(reader.is_empty());
    }
}
