//! High-level archive operations for PSArc files.
//!
//! `PsarcArchive` owns the index and the underlying source. Dropping it (and
//! every handle opened from it) releases the source; a failed open never
//! hands back a partially built archive.

use crate::callbacks::ArchiveHandler;
use crate::error::Result;
use crate::fs::PsarcFileSystem;
use crate::options::OpenOptions;
use crate::reader::PsarcReader;
use crate::source::ReadAt;
use std::ops::Deref;
use std::path::Path;

/// High-level interface for working with PSArc archives
pub struct PsarcArchive {
    reader: PsarcReader,
}

impl PsarcArchive {
    /// Opens an existing PSArc archive
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = PsarcReader::open(path)?;
        Ok(Self { reader })
    }

    /// Opens a PSArc archive with custom options
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: &OpenOptions) -> Result<Self> {
        let reader = PsarcReader::open_with_options(path, options)?;
        Ok(Self { reader })
    }

    /// Opens an archive held by any positioned-read source, such as a `Vec<u8>`
    pub fn from_source<S: ReadAt + 'static>(source: S, options: &OpenOptions) -> Result<Self> {
        let reader = PsarcReader::from_source(source, options)?;
        Ok(Self { reader })
    }

    /// Extracts a specific file to the given path
    pub fn extract_file<P: AsRef<Path>>(&self, name: &str, output_path: P) -> Result<()> {
        self.reader.extract_file(name, output_path)
    }

    /// Extracts a specific file with progress reporting
    pub fn extract_file_with_progress<P: AsRef<Path>, H: ArchiveHandler>(
        &self,
        name: &str,
        output_path: P,
        handler: &mut H,
    ) -> Result<()> {
        self.reader
            .extract_file_with_progress(name, output_path, handler)
    }

    /// Gets the underlying reader (for advanced use cases)
    pub fn reader(&self) -> &PsarcReader {
        &self.reader
    }

    /// Turns the archive into its read-only filesystem view
    pub fn into_filesystem(self) -> PsarcFileSystem {
        PsarcFileSystem::new(self.reader)
    }
}

impl Deref for PsarcArchive {
    type Target = PsarcReader;

    fn deref(&self) -> &Self::Target {
        &self.reader
    }
}

// Convenience functions for one-off operations

/// Extracts a PSArc archive to the specified directory
pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(archive_path: P, output_dir: Q) -> Result<()> {
    let archive = PsarcArchive::open(archive_path)?;
    archive.extract_all(output_dir)
}

/// Extracts a PSArc archive to the specified directory with progress reporting
pub fn extract_with_progress<P: AsRef<Path>, Q: AsRef<Path>, H: ArchiveHandler>(
    archive_path: P,
    output_dir: Q,
    handler: &mut H,
) -> Result<()> {
    let archive = PsarcArchive::open(archive_path)?;
    archive.extract_all_with_progress(output_dir, handler)
}
