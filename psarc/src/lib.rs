//! # PSArc Archive Library
//!
//! A Rust library for reading PlayStation archive (PSArc) files and exposing
//! them as a read-only filesystem.
//!
//! - **Index**: header, TOC and block-size table are decoded once at open
//! - **Names**: entry 0 is the manifest; its lines name entries 1.. in order
//! - **Data**: entries are split into fixed-size blocks, each stored raw or
//!   compressed (zlib, or LZMA with the `lzma` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use psarc::{FileSystem, PsarcArchive, Result};
//! use std::io::Read;
//!
//! # fn main() -> Result<()> {
//! let archive = PsarcArchive::open("songs.psarc")?;
//!
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.name(), entry.size());
//! }
//! for warning in archive.warnings() {
//!     eprintln!("warning: {warning}");
//! }
//!
//! // Read one entry through a seekable handle
//! let mut reader = archive.open_entry("songs/intro.ogg")?;
//! let mut data = Vec::new();
//! reader.read_to_end(&mut data)?;
//!
//! // Or view the archive as a filesystem
//! let fs = archive.into_filesystem();
//! for path in fs.list_entries("songs") {
//!     println!("{path}: {} bytes", fs.file_length(path)?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Random Access**: only the blocks covering a requested range are decoded
//! - **Concurrent Reads**: handles use positioned reads on a shared source
//! - **Degraded Open**: a bad manifest yields digest-based names and a warning
//! - **Pluggable Codecs**: register a `Decompressor` for any codec id

pub mod archive;
pub mod block;
pub mod callbacks;
pub mod codec;
pub mod cursor;
pub mod digest;
pub mod entry;
pub mod error;
pub mod format;
pub mod fs;
pub mod header;
pub mod manifest;
pub mod options;
pub mod reader;
pub mod source;
pub mod toc;

mod utils;

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod testutil;

// Re-export main types for convenience
pub use archive::PsarcArchive;
pub use block::EntryReader;
pub use callbacks::{ArchiveHandler, ControlAction, NoOpHandler, ProgressInfo};
pub use codec::{CompressionType, Decompressor};
pub use entry::PsarcEntry;
pub use error::{Error, Result};
pub use fs::{FileSystem, PsarcFileSystem};
pub use header::ArchiveHeader;
pub use options::OpenOptions;
pub use reader::PsarcReader;
pub use source::ReadAt;

// Re-export convenience functions
pub use archive::{extract, extract_with_progress};

#[cfg(feature = "display")]
pub mod display;

#[cfg(feature = "display")]
pub use display::list_archive;
