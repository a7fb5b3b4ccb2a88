//! Error types for the PSArc library.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::codec::CompressionType;

/// A specialized `Result` type for PSArc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for PSArc operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive file could not be opened.
    #[error("archive source unavailable: {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The first four bytes are not `PSAR`.
    #[error("invalid PSArc magic: expected 0x50534152, got {found:#010x}")]
    InvalidMagic { found: u32 },

    /// The header block size does not select a known table width.
    #[error("unsupported block size: {0}")]
    UnsupportedBlockSize(u32),

    /// No decompressor is registered for the header's codec id.
    #[error("unsupported compression type: {0}")]
    UnsupportedCompression(CompressionType),

    /// Header, TOC and block table sizes do not add up.
    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),

    /// Fewer bytes remained than a field needed.
    #[error("truncated archive: needed {needed} bytes at offset {offset}")]
    Truncated { offset: u64, needed: usize },

    /// The manifest does not name every entry.
    #[error("manifest lists {found} paths but the archive has {expected} named entries")]
    ManifestMismatch { expected: usize, found: usize },

    /// The manifest entry could not be decoded.
    #[error("manifest unreadable: {0}")]
    ManifestUnreadable(String),

    /// A block failed to decompress.
    #[error("corrupt block {block}: {reason}")]
    CorruptBlock { block: u64, reason: String },

    /// Path not found in the archive.
    #[error("not found in archive: {0}")]
    NotFound(String),

    /// A mutation was attempted on the read-only archive.
    #[error("PSArc filesystem is read-only: {operation} {path}")]
    ReadOnlyViolation {
        operation: &'static str,
        path: String,
    },

    /// Operation was aborted by a handler.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Returns true for conditions that only degrade an opened archive.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Error::ManifestMismatch { .. } | Error::ManifestUnreadable(_)
        )
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(err) => err,
            Error::NotFound(_) => io::Error::new(io::ErrorKind::NotFound, err),
            Error::ReadOnlyViolation { .. } => io::Error::new(io::ErrorKind::PermissionDenied, err),
            Error::Truncated { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
