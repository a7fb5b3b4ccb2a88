//! Archive index construction and entry reads.

use crate::block::{BlockReader, BlockStore, EntryReader};
use crate::callbacks::{ArchiveHandler, ControlAction, NoOpHandler, ProgressInfo};
use crate::cursor::BeCursor;
use crate::digest;
use crate::entry::PsarcEntry;
use crate::error::{Error, Result};
use crate::header::ArchiveHeader;
use crate::manifest;
use crate::options::OpenOptions;
use crate::source::{LockedSource, ReadAt, SourceReader};
use crate::toc::{self, BlockTable};
use crate::utils;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;
use std::sync::Arc;

/// Reader for PSArc archives.
///
/// The whole index (header, TOC, block table and resolved names) is built
/// once when the archive is opened and never changes afterwards. Entry data
/// is decoded on demand, one block at a time, through positioned reads on
/// the shared source, so a reader can be shared across threads and every
/// handle from `open_entry` reads independently.
pub struct PsarcReader {
    header: ArchiveHeader,
    store: Arc<BlockStore>,
    /// Named entries 1.. in TOC order
    entries: Vec<PsarcEntry>,
    /// Lookup map for fast entry access by path
    entry_map: HashMap<String, usize>,
    /// Conditions that degraded the open
    warnings: Vec<Error>,
    cache_blocks: usize,
}

impl PsarcReader {
    /// Opens a PSArc archive from disk with default options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, &OpenOptions::default())
    }

    /// Opens a PSArc archive from disk
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: &OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(file, options)
    }

    /// Builds a reader over any positioned-read source
    pub fn from_source<S: ReadAt + 'static>(source: S, options: &OpenOptions) -> Result<Self> {
        Self::build(Arc::new(source), options)
    }

    /// Builds a reader over a plain stream; reads are serialized on it
    pub fn from_stream<R: Read + Seek + Send + 'static>(
        stream: R,
        options: &OpenOptions,
    ) -> Result<Self> {
        Self::from_source(LockedSource::new(stream), options)
    }

    fn build(source: Arc<dyn ReadAt>, options: &OpenOptions) -> Result<Self> {
        let (header, toc, table) = {
            let mut cursor = BeCursor::new(SourceReader::new(&*source, 0), 0);
            let header = ArchiveHeader::parse(&mut cursor)?;
            if !options.codecs.supports(header.compression_type) {
                return Err(Error::UnsupportedCompression(header.compression_type));
            }
            let toc = toc::parse_entries(&header, &mut cursor)?;
            let table = BlockTable::parse(&header, &mut cursor)?;
            table.check_entries(&toc)?;
            (header, toc, table)
        };

        debug!(
            "PSArc v{} {}: {} entries, {} blocks of {} bytes",
            header.version(),
            header.compression_type,
            header.toc_entry_count,
            table.len(),
            header.block_size
        );

        let codec = options
            .codecs
            .get(header.compression_type)
            .ok_or(Error::UnsupportedCompression(header.compression_type))?;
        let store = Arc::new(BlockStore::new(source, table, codec));

        // Only needed when there are entries to name
        let manifest_bytes = match toc.first() {
            Some(entry) if toc.len() > 1 => {
                BlockReader::new(store.clone(), 0).read_range(entry, 0, entry.decompressed_length)
            }
            _ => Ok(Vec::new()),
        };

        let resolution = manifest::resolve(&toc, manifest_bytes);
        let mut warnings = Vec::new();
        if let Some(warning) = resolution.warning {
            if options.strict_manifest {
                return Err(warning);
            }
            warnings.push(warning);
        }

        let entries = resolution.entries;
        let mut entry_map = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if entry_map.contains_key(entry.name()) {
                warn!(
                    "duplicate path {:?} at TOC index {}, only the first is addressable by name",
                    entry.name(),
                    entry.index()
                );
                continue;
            }
            entry_map.insert(entry.name().to_string(), position);
        }

        Ok(Self {
            header,
            store,
            entries,
            entry_map,
            warnings,
            cache_blocks: options.cache_blocks,
        })
    }

    /// Gets the decoded header
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Gets the global block size table
    pub fn block_table(&self) -> &BlockTable {
        self.store.table()
    }

    /// Returns an iterator over all named entries, manifest excluded
    pub fn entries(&self) -> impl Iterator<Item = &PsarcEntry> + Clone {
        self.entries.iter()
    }

    /// Gets the number of named entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the archive has no named entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Conditions that degraded the open, such as a manifest mismatch
    pub fn warnings(&self) -> &[Error] {
        &self.warnings
    }

    /// Returns true when names come from digests instead of the manifest
    pub fn has_synthetic_names(&self) -> bool {
        self.entries.iter().any(PsarcEntry::is_synthetic)
    }

    /// Gets an entry by its exact stored path
    pub fn get_entry(&self, name: &str) -> Option<&PsarcEntry> {
        self.entry_map.get(name).map(|&index| &self.entries[index])
    }

    /// Checks if a file exists in the archive
    pub fn contains(&self, name: &str) -> bool {
        self.entry_map.contains_key(name)
    }

    fn require(&self, name: &str) -> Result<&PsarcEntry> {
        self.get_entry(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Opens a seekable handle over an entry's content
    pub fn open_entry(&self, name: &str) -> Result<EntryReader> {
        let entry = self.require(name)?;
        Ok(self.open_entry_at(entry))
    }

    /// Opens a handle for an entry obtained from `entries()`
    pub fn open_entry_at(&self, entry: &PsarcEntry) -> EntryReader {
        EntryReader::new(self.store.clone(), *entry.toc(), self.cache_blocks)
    }

    /// Reads a file's data by path
    pub fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let mut result = Vec::new();
        self.read_file_streaming(name, |chunk| {
            result.extend_from_slice(chunk);
            Ok(())
        })?;
        Ok(result)
    }

    /// Feeds a file's decoded blocks to `callback` in order
    pub fn read_file_streaming<F>(&self, name: &str, mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let entry = *self.require(name)?.toc();
        for rel in 0..entry.block_count(self.header.block_size) {
            let block = self.store.decode(&entry, rel)?;
            callback(&block)?;
        }
        Ok(())
    }

    /// Entries whose stored digest does not match their manifest path
    pub fn verify_names(&self) -> Vec<&PsarcEntry> {
        self.entries
            .iter()
            .filter(|entry| !entry.is_synthetic())
            .filter(|entry| {
                digest::name_digest(entry.name(), self.header.archive_flags) != *entry.digest()
            })
            .collect()
    }

    /// Extracts all files to the specified directory
    pub fn extract_all<P: AsRef<Path>>(&self, output_dir: P) -> Result<()> {
        let mut handler = NoOpHandler;
        self.extract_all_with_progress(output_dir, &mut handler)
    }

    /// Extracts all files with progress reporting and abort support
    pub fn extract_all_with_progress<P: AsRef<Path>, H: ArchiveHandler>(
        &self,
        output_dir: P,
        handler: &mut H,
    ) -> Result<()> {
        let output_dir = output_dir.as_ref();

        let total_bytes: u64 = self.entries.iter().map(PsarcEntry::size).sum();
        let total_files = self.entries.len();
        let mut total_bytes_processed = 0u64;

        if handler.on_started() == ControlAction::Abort {
            return Err(Error::Cancelled);
        }

        for (index, entry) in self.entries.iter().enumerate() {
            let Some(relative) = utils::archive_path_to_relative(entry.name()) else {
                warn!("Skipping entry with unusable path {:?}", entry.name());
                continue;
            };
            let file_path = output_dir.join(relative);

            if handler.on_entry_started(entry.name()) == ControlAction::Abort {
                return Err(Error::Cancelled);
            }

            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            total_bytes_processed += self.extract_entry_with_progress(
                entry,
                &file_path,
                (index + 1, total_files),
                (total_bytes_processed, total_bytes),
                handler,
            )?;

            if handler.on_entry_finished(entry.name()) == ControlAction::Abort {
                return Err(Error::Cancelled);
            }
        }

        handler.on_finished();

        Ok(())
    }

    /// Extracts a single file to `output_path`
    pub fn extract_file<Q: AsRef<Path>>(&self, name: &str, output_path: Q) -> Result<()> {
        let mut handler = NoOpHandler;
        self.extract_file_with_progress(name, output_path, &mut handler)
    }

    /// Extracts a single file with progress reporting
    pub fn extract_file_with_progress<Q: AsRef<Path>, H: ArchiveHandler>(
        &self,
        name: &str,
        output_path: Q,
        handler: &mut H,
    ) -> Result<()> {
        let output_path = output_path.as_ref();
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let entry = self.require(name)?;

        if handler.on_started() == ControlAction::Abort {
            return Err(Error::Cancelled);
        }
        if handler.on_entry_started(entry.name()) == ControlAction::Abort {
            return Err(Error::Cancelled);
        }

        self.extract_entry_with_progress(entry, output_path, (1, 1), (0, entry.size()), handler)?;

        if handler.on_entry_finished(entry.name()) == ControlAction::Abort {
            return Err(Error::Cancelled);
        }

        handler.on_finished();

        Ok(())
    }

    /// Streams one entry to disk block by block, reporting after each block
    fn extract_entry_with_progress<H: ArchiveHandler>(
        &self,
        entry: &PsarcEntry,
        output_path: &Path,
        (processed_files, total_files): (usize, usize),
        (bytes_before, total_bytes): (u64, u64),
        handler: &mut H,
    ) -> Result<u64> {
        let mut output_file = File::create(output_path)?;
        let toc = *entry.toc();
        let mut written = 0u64;

        for rel in 0..toc.block_count(self.header.block_size) {
            let block = self.store.decode(&toc, rel)?;
            output_file.write_all(&block)?;
            written += block.len() as u64;

            let progress = ProgressInfo {
                processed_bytes: bytes_before + written,
                total_bytes: Some(total_bytes),
                processed_files,
                total_files: Some(total_files),
                current_file: entry.name().to_string(),
            };
            if handler.on_progress(&progress) == ControlAction::Abort {
                return Err(Error::Cancelled);
            }
        }

        Ok(written)
    }
}
