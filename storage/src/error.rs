//! Typed failure conditions of the cache store

use crate::meta::{Compression, Version};
use common::{Feed, Symbol, SymbolError};
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong opening, reading or writing a cache file.
///
/// Format violations are fatal for the single file and are never coerced to
/// an empty cache; a missing file on read-open is NOT an error and is
/// reported through `is_empty()` instead.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Writer target already exists; writers never overwrite.
    #[error("cache file already exists: {path}")]
    AlreadyExists {
        /// The colliding path.
        path: PathBuf,
    },
    /// File too short to hold a header, or the header failed to decode.
    #[error("invalid cache file: missing or short header")]
    BadHeader,
    /// Header declares a different feed than the requested key.
    #[error("invalid cache file: expected feed {expected}, found {found}")]
    FeedMismatch {
        /// Feed of the requested key.
        expected: Feed,
        /// Feed found in the header.
        found: Feed,
    },
    /// Header declares a different symbol than the requested key.
    #[error("invalid cache file: expected symbol {expected}, found {found}")]
    SymbolMismatch {
        /// Symbol of the requested key.
        expected: Symbol,
        /// Symbol found in the header.
        found: Symbol,
    },
    /// Header's format version is from an incompatible writer.
    #[error("incompatible cache format version {found}, supported {supported}")]
    IncompatibleVersion {
        /// Version found in the header.
        found: Version,
        /// Version this build supports.
        supported: Version,
    },
    /// Header carries a compression code this build does not know.
    #[error("invalid cache file: unknown compression code {code}")]
    UnknownCompression {
        /// The raw code.
        code: i32,
    },
    /// Header carries a feed code this build does not know.
    #[error("invalid cache file: unknown feed code {code}")]
    UnknownFeedCode {
        /// The raw code.
        code: i32,
    },
    /// The stream ended inside a record; distinct from clean EOF at a
    /// record boundary.
    #[error("stream ended mid-record: got {got} of {expected} bytes")]
    ShortRead {
        /// Bytes the record needed.
        expected: usize,
        /// Bytes actually obtained.
        got: usize,
    },
    /// The stream ended cleanly but before the header-declared record count.
    #[error("cache stream ended after {read} of {expected} records")]
    MissingRecords {
        /// Records the header declared.
        expected: i64,
        /// Records actually read.
        read: i64,
    },
    /// Zero-copy mapping requested for a compressed file.
    #[error("memory-mapped access requires an uncompressed file, found {compression}")]
    CompressedMap {
        /// Compression declared by the header.
        compression: Compression,
    },
    /// Mapped file is shorter than `header + item_count * record_size`.
    #[error("cache file is shorter than its header declares: need {needed} bytes, have {actual}")]
    Truncated {
        /// Bytes the header implies.
        needed: u64,
        /// Bytes actually present.
        actual: u64,
    },
    /// Source and destination roots of a recompression are identical.
    #[error("source and destination roots are the same")]
    SameRoot,
    /// Key could not be resolved to a path.
    #[error(transparent)]
    Key(#[from] SymbolError),
    /// Underlying I/O failure, passed through unmodified.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
