//! Binary market-data cache: one file per (symbol, date, feed)
//!
//! Layout is a fixed 72-byte header followed by fixed-size records. The
//! header is always stored raw so it can be read before the compression
//! algorithm is known; the record region may be deflate/gzip compressed.
//! Uncompressed files additionally support memory-mapped zero-copy reads.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod error;
pub mod meta;
pub mod mmap;
pub mod reader;
pub mod recompress;
pub mod writer;

pub use codec::{read_record, read_struct, record_size, write_record, write_struct, Record};
pub use error::CacheError;
pub use meta::{CacheMeta, Compression, Version, FORMAT_VERSION, META_SIZE};
pub use mmap::MappedReader;
pub use reader::{CacheReader, CacheRecords, ReadUntil};
pub use recompress::recompress;
pub use writer::CacheWriter;
