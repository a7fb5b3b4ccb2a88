//! Read-only virtual filesystem view of an archive.
//!
//! Paths compare exactly as the manifest stores them. The format has no
//! directory records; a directory exists when some entry lives under it.
//! Every mutating operation fails with `Error::ReadOnlyViolation`.

use crate::block::EntryReader;
use crate::error::{Error, Result};
use crate::options::OpenOptions;
use crate::reader::PsarcReader;
use crate::source::ReadAt;
use crate::utils;
use std::io::{Read, Seek};
use std::path::Path;
use std::time::SystemTime;

/// Kind of a filesystem node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

/// Attributes reported for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttributes {
    pub kind: NodeKind,
    pub read_only: bool,
}

/// A read-only, byte-addressable hierarchical namespace
pub trait FileSystem {
    /// Handle returned by `open_read`
    type Reader: Read + Seek;

    fn file_exists(&self, path: &str) -> bool;

    fn directory_exists(&self, path: &str) -> bool;

    /// Decompressed length of a file
    fn file_length(&self, path: &str) -> Result<u64>;

    fn attributes(&self, path: &str) -> Result<FileAttributes>;

    /// Opens a file for reading
    fn open_read(&self, path: &str) -> Result<Self::Reader>;

    /// Lazily yields every file path under `prefix`; an empty prefix lists all
    fn list_entries<'a>(&'a self, prefix: &str) -> Box<dyn Iterator<Item = &'a str> + 'a>;

    fn create_directory(&self, path: &str) -> Result<()>;

    fn delete_directory(&self, path: &str, recursive: bool) -> Result<()>;

    fn move_directory(&self, src: &str, dest: &str) -> Result<()>;

    fn create_file(&self, path: &str) -> Result<()>;

    fn delete_file(&self, path: &str) -> Result<()>;

    fn move_file(&self, src: &str, dest: &str) -> Result<()>;

    fn copy_file(&self, src: &str, dest: &str, overwrite: bool) -> Result<()>;

    fn replace_file(&self, src: &str, dest: &str, backup: Option<&str>) -> Result<()>;

    fn set_attributes(&self, path: &str, attributes: FileAttributes) -> Result<()>;

    fn set_creation_time(&self, path: &str, time: SystemTime) -> Result<()>;

    fn set_last_access_time(&self, path: &str, time: SystemTime) -> Result<()>;

    fn set_last_write_time(&self, path: &str, time: SystemTime) -> Result<()>;
}

fn read_only(operation: &'static str, path: &str) -> Result<()> {
    Err(Error::ReadOnlyViolation {
        operation,
        path: path.to_string(),
    })
}

/// Filesystem facade over an opened PSArc archive
pub struct PsarcFileSystem {
    reader: PsarcReader,
}

impl PsarcFileSystem {
    pub fn new(reader: PsarcReader) -> Self {
        Self { reader }
    }

    /// Opens an archive file as a filesystem
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        PsarcReader::open(path).map(Self::new)
    }

    pub fn open_with_options<P: AsRef<Path>>(path: P, options: &OpenOptions) -> Result<Self> {
        PsarcReader::open_with_options(path, options).map(Self::new)
    }

    pub fn from_source<S: ReadAt + 'static>(source: S, options: &OpenOptions) -> Result<Self> {
        PsarcReader::from_source(source, options).map(Self::new)
    }

    pub fn reader(&self) -> &PsarcReader {
        &self.reader
    }

    /// Warnings raised while opening, e.g. a manifest mismatch
    pub fn warnings(&self) -> &[Error] {
        self.reader.warnings()
    }
}

impl FileSystem for PsarcFileSystem {
    type Reader = EntryReader;

    fn file_exists(&self, path: &str) -> bool {
        self.reader.contains(path)
    }

    fn directory_exists(&self, path: &str) -> bool {
        let prefix = utils::directory_prefix(path);
        prefix.is_empty()
            || self
                .reader
                .entries()
                .any(|entry| entry.name().starts_with(&prefix))
    }

    fn file_length(&self, path: &str) -> Result<u64> {
        self.reader
            .get_entry(path)
            .map(|entry| entry.size())
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    fn attributes(&self, path: &str) -> Result<FileAttributes> {
        let kind = if self.file_exists(path) {
            NodeKind::File
        } else if self.directory_exists(path) {
            NodeKind::Directory
        } else {
            return Err(Error::NotFound(path.to_string()));
        };
        Ok(FileAttributes {
            kind,
            read_only: true,
        })
    }

    fn open_read(&self, path: &str) -> Result<EntryReader> {
        self.reader.open_entry(path)
    }

    fn list_entries<'a>(&'a self, prefix: &str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        let prefix = utils::directory_prefix(prefix);
        Box::new(
            self.reader
                .entries()
                // Later duplicates are not addressable by path
                .filter(move |entry| {
                    self.reader
                        .get_entry(entry.name())
                        .is_some_and(|first| first.index() == entry.index())
                })
                .map(|entry| entry.name())
                .filter(move |name| name.starts_with(&prefix)),
        )
    }

    fn create_directory(&self, path: &str) -> Result<()> {
        read_only("create directory", path)
    }

    fn delete_directory(&self, path: &str, _recursive: bool) -> Result<()> {
        read_only("delete directory", path)
    }

    fn move_directory(&self, src: &str, _dest: &str) -> Result<()> {
        read_only("move directory", src)
    }

    fn create_file(&self, path: &str) -> Result<()> {
        read_only("create file", path)
    }

    fn delete_file(&self, path: &str) -> Result<()> {
        read_only("delete file", path)
    }

    fn move_file(&self, src: &str, _dest: &str) -> Result<()> {
        read_only("move file", src)
    }

    fn copy_file(&self, src: &str, _dest: &str, _overwrite: bool) -> Result<()> {
        read_only("copy file", src)
    }

    fn replace_file(&self, src: &str, _dest: &str, _backup: Option<&str>) -> Result<()> {
        read_only("replace file", src)
    }

    fn set_attributes(&self, path: &str, _attributes: FileAttributes) -> Result<()> {
        read_only("set attributes", path)
    }

    fn set_creation_time(&self, path: &str, _time: SystemTime) -> Result<()> {
        read_only("set creation time", path)
    }

    fn set_last_access_time(&self, path: &str, _time: SystemTime) -> Result<()> {
        read_only("set last access time", path)
    }

    fn set_last_write_time(&self, path: &str, _time: SystemTime) -> Result<()> {
        read_only("set last write time", path)
    }
}
