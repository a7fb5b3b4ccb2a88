//! Block-indexed random access into entry payloads.
//!
//! Entries are stored as runs of independently compressed blocks. A read
//! decodes only the blocks overlapping the requested range; each handle
//! keeps its own small cache of decoded blocks.

use crate::codec::Decompressor;
use crate::error::{Error, Result};
use crate::format::MAX_PREALLOC;
use crate::source::{ReadAt, SourceReader};
use crate::toc::{BlockTable, TocEntry};
use log::trace;
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::Range;
use std::sync::Arc;

/// Entry-relative indices of the blocks overlapping `[start, end)`
pub fn covering_blocks(length: u64, block_size: u32, start: u64, end: u64) -> Range<u64> {
    let end = end.min(length);
    if start >= end {
        return 0..0;
    }
    let block_size = block_size as u64;
    start / block_size..(end - 1) / block_size + 1
}

/// Shared, immutable access to the stored blocks of one archive
pub struct BlockStore {
    source: Arc<dyn ReadAt>,
    table: BlockTable,
    codec: Arc<dyn Decompressor>,
}

impl BlockStore {
    pub fn new(source: Arc<dyn ReadAt>, table: BlockTable, codec: Arc<dyn Decompressor>) -> Self {
        Self {
            source,
            table,
            codec,
        }
    }

    pub fn table(&self) -> &BlockTable {
        &self.table
    }

    pub fn block_size(&self) -> u32 {
        self.table.block_size()
    }

    /// Decoded length of the entry's `rel`-th block; the last one may be short
    fn logical_len(&self, entry: &TocEntry, rel: u64) -> u64 {
        let block_size = self.block_size() as u64;
        (entry.decompressed_length - rel * block_size).min(block_size)
    }

    /// Decodes the entry's `rel`-th block
    pub fn decode(&self, entry: &TocEntry, rel: u64) -> Result<Vec<u8>> {
        let start = entry.block_index_start as u64;
        let block = start + rel;
        let logical = self.logical_len(entry, rel);

        let (raw, stored, offset) = match (
            self.table.raw_size(block),
            self.table.stored_len(block),
            self.table.offset_of(block),
            self.table.offset_of(start),
        ) {
            (Some(raw), Some(stored), Some(at), Some(base)) => {
                (raw, stored, entry.payload_offset + (at - base))
            }
            _ => {
                return Err(Error::CorruptBlock {
                    block,
                    reason: "block index outside the block size table".to_string(),
                });
            }
        };

        // A zero entry, or one equal to the logical length, is stored raw
        if raw == 0 || stored == logical {
            trace!("block {block}: {logical} raw bytes at {offset}");
            return self.read_stored(offset, logical);
        }

        trace!("block {block}: {stored} stored bytes at {offset} -> {logical}");
        let data = self.read_stored(offset, stored)?;
        let decoded = self
            .codec
            .decompress(&data, logical as usize)
            .map_err(|err| Error::CorruptBlock {
                block,
                reason: err.to_string(),
            })?;

        if decoded.len() as u64 != logical {
            return Err(Error::CorruptBlock {
                block,
                reason: format!("decoded {} bytes, expected {}", decoded.len(), logical),
            });
        }
        Ok(decoded)
    }

    /// Reads `len` stored bytes; the buffer grows only as bytes arrive
    fn read_stored(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(len.min(MAX_PREALLOC as u64) as usize);
        SourceReader::new(&*self.source, offset)
            .take(len)
            .read_to_end(&mut data)?;
        if (data.len() as u64) < len {
            return Err(Error::Truncated {
                offset: offset + data.len() as u64,
                needed: usize::try_from(len - data.len() as u64).unwrap_or(usize::MAX),
            });
        }
        Ok(data)
    }
}

/// Least-recently-used cache of decoded blocks, keyed by global index
#[derive(Debug)]
struct BlockCache {
    capacity: usize,
    /// Most recently used last
    slots: Vec<(u64, Arc<[u8]>)>,
}

impl BlockCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
        }
    }

    fn get(&mut self, block: u64) -> Option<Arc<[u8]>> {
        let pos = self.slots.iter().position(|(b, _)| *b == block)?;
        let slot = self.slots.remove(pos);
        let data = slot.1.clone();
        self.slots.push(slot);
        Some(data)
    }

    fn insert(&mut self, block: u64, data: Arc<[u8]>) {
        if self.capacity == 0 {
            return;
        }
        if self.slots.len() == self.capacity {
            self.slots.remove(0);
        }
        self.slots.push((block, data));
    }
}

/// Per-handle block reader
pub struct BlockReader {
    store: Arc<BlockStore>,
    cache: BlockCache,
}

impl BlockReader {
    pub fn new(store: Arc<BlockStore>, cache_blocks: usize) -> Self {
        Self {
            store,
            cache: BlockCache::new(cache_blocks),
        }
    }

    fn block(&mut self, entry: &TocEntry, rel: u64) -> Result<Arc<[u8]>> {
        let global = entry.block_index_start as u64 + rel;
        if let Some(data) = self.cache.get(global) {
            return Ok(data);
        }
        let data: Arc<[u8]> = self.store.decode(entry, rel)?.into();
        self.cache.insert(global, data.clone());
        Ok(data)
    }

    /// Hands `sink` the slices of each decoded block inside `[start, end)`
    fn for_each_slice<F>(
        &mut self,
        entry: &TocEntry,
        start: u64,
        end: u64,
        mut sink: F,
    ) -> Result<()>
    where
        F: FnMut(&[u8]),
    {
        let length = entry.decompressed_length;
        let block_size = self.store.block_size() as u64;
        for rel in covering_blocks(length, self.store.block_size(), start, end) {
            let data = self.block(entry, rel)?;
            let block_start = rel * block_size;
            let from = start.max(block_start);
            let to = end.min(block_start + data.len() as u64);
            sink(&data[(from - block_start) as usize..(to - block_start) as usize]);
        }
        Ok(())
    }

    /// Fills `buf` from `offset` within the entry; returns the bytes copied
    pub fn read_at(&mut self, entry: &TocEntry, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let length = entry.decompressed_length;
        if offset >= length || buf.is_empty() {
            return Ok(0);
        }
        let end = length.min(offset + buf.len() as u64);

        let mut copied = 0;
        self.for_each_slice(entry, offset, end, |slice| {
            buf[copied..copied + slice.len()].copy_from_slice(slice);
            copied += slice.len();
        })?;
        Ok(copied)
    }

    /// Returns exactly the bytes in `[start, end)`, clamped to the entry.
    ///
    /// The result grows block by block, so a bogus TOC length costs no more
    /// memory than the blocks that actually decode.
    pub fn read_range(&mut self, entry: &TocEntry, start: u64, end: u64) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.for_each_slice(entry, start, end, |slice| data.extend_from_slice(slice))?;
        Ok(data)
    }

    /// Global indices of the blocks currently cached, ascending
    pub fn cached_blocks(&self) -> Vec<u64> {
        let mut blocks: Vec<u64> = self.cache.slots.iter().map(|(b, _)| *b).collect();
        blocks.sort_unstable();
        blocks
    }
}

/// Seekable read-only handle over one entry's decompressed content
pub struct EntryReader {
    entry: TocEntry,
    reader: BlockReader,
    position: u64,
}

impl EntryReader {
    pub fn new(store: Arc<BlockStore>, entry: TocEntry, cache_blocks: usize) -> Self {
        Self {
            entry,
            reader: BlockReader::new(store, cache_blocks),
            position: 0,
        }
    }

    /// Decompressed length of the entry
    pub fn len(&self) -> u64 {
        self.entry.decompressed_length
    }

    pub fn is_empty(&self) -> bool {
        self.entry.decompressed_length == 0
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads `[start, end)` without moving the handle's position
    pub fn read_range(&mut self, start: u64, end: u64) -> Result<Vec<u8>> {
        self.reader.read_range(&self.entry, start, end)
    }

    /// Global indices of the blocks this handle has cached
    pub fn cached_blocks(&self) -> Vec<u64> {
        self.reader.cached_blocks()
    }
}

impl Read for EntryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read_at(&self.entry, self.position, buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for EntryReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::End(delta) => self.len().checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };
        match target {
            Some(n) => {
                self.position = n;
                Ok(n)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}
