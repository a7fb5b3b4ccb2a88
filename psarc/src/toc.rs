//! Table of contents and the global block size table.

use crate::cursor::BeCursor;
use crate::error::{Error, Result};
use crate::format::{BlockWidth, TOC_ENTRY_SIZE};
use crate::header::ArchiveHeader;
use std::io::Read;
use std::ops::Range;

/// One TOC record as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocEntry {
    /// Conventionally the MD5 of the entry's path
    pub name_digest: [u8; 16],
    /// First slot of this entry in the block size table
    pub block_index_start: u32,
    pub decompressed_length: u64,
    /// Absolute offset of the entry's first stored block
    pub payload_offset: u64,
}

impl TocEntry {
    /// Number of blocks the entry occupies
    pub fn block_count(&self, block_size: u32) -> u64 {
        self.decompressed_length.div_ceil(block_size as u64)
    }

    /// Global block indices covered by this entry
    pub fn block_span(&self, block_size: u32) -> Range<u64> {
        let start = self.block_index_start as u64;
        start..start + self.block_count(block_size)
    }
}

/// Reads `header.toc_entry_count` records from a cursor positioned at the
/// end of the header.
pub fn parse_entries<R: Read>(
    header: &ArchiveHeader,
    cursor: &mut BeCursor<R>,
) -> Result<Vec<TocEntry>> {
    if header.toc_entry_size != TOC_ENTRY_SIZE {
        return Err(Error::StructuralMismatch(format!(
            "TOC entry size is {}, expected {}",
            header.toc_entry_size, TOC_ENTRY_SIZE
        )));
    }
    if (header.toc_length as u64) < header.toc_end() {
        return Err(Error::StructuralMismatch(format!(
            "TOC length {} is too small for {} entries",
            header.toc_length, header.toc_entry_count
        )));
    }

    let mut entries = Vec::with_capacity(header.toc_entry_count as usize);
    for _ in 0..header.toc_entry_count {
        let name_digest = cursor.read_array::<16>()?;
        let block_index_start = cursor.read_u32()?;
        let decompressed_length = cursor.read_u40()?;
        let payload_offset = cursor.read_u40()?;
        entries.push(TocEntry {
            name_digest,
            block_index_start,
            decompressed_length,
            payload_offset,
        });
    }

    Ok(entries)
}

/// Stored block sizes for the whole archive, with precomputed offsets
#[derive(Debug, Clone)]
pub struct BlockTable {
    block_size: u32,
    sizes: Vec<u32>,
    /// `prefix[k]` is the stored length of every block before `k`
    prefix: Vec<u64>,
}

impl BlockTable {
    /// Builds the table from raw element values
    pub fn new(block_size: u32, sizes: Vec<u32>) -> Self {
        let mut prefix = Vec::with_capacity(sizes.len() + 1);
        let mut total = 0u64;
        prefix.push(0);
        for &size in &sizes {
            total += stored_len(size, block_size);
            prefix.push(total);
        }
        Self {
            block_size,
            sizes,
            prefix,
        }
    }

    /// Reads the table that fills the rest of the TOC region
    pub fn parse<R: Read>(header: &ArchiveHeader, cursor: &mut BeCursor<R>) -> Result<Self> {
        let width = header.block_width;
        let consumed = cursor.position();
        let remaining = (header.toc_length as u64)
            .checked_sub(consumed)
            .ok_or_else(|| {
                Error::StructuralMismatch(format!(
                    "TOC length {} ends before offset {}",
                    header.toc_length, consumed
                ))
            })?;

        if remaining % width.bytes() != 0 {
            return Err(Error::StructuralMismatch(format!(
                "block size table of {} bytes is not a multiple of {}",
                remaining,
                width.bytes()
            )));
        }

        let count = (remaining / width.bytes()) as usize;
        let mut sizes = Vec::with_capacity(count);
        for _ in 0..count {
            let value = match width {
                BlockWidth::U16 => cursor.read_u16()? as u32,
                BlockWidth::U24 => cursor.read_u24()?,
                BlockWidth::U32 => cursor.read_u32()?,
            };
            sizes.push(value);
        }

        Ok(Self::new(header.block_size, sizes))
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Raw table value, 0 meaning a full uncompressed block
    pub fn raw_size(&self, block: u64) -> Option<u32> {
        self.sizes.get(usize::try_from(block).ok()?).copied()
    }

    /// Bytes the block occupies in the archive
    pub fn stored_len(&self, block: u64) -> Option<u64> {
        self.raw_size(block).map(|size| stored_len(size, self.block_size))
    }

    /// Stored bytes of all blocks before `block`
    pub fn offset_of(&self, block: u64) -> Option<u64> {
        self.prefix.get(usize::try_from(block).ok()?).copied()
    }

    /// Checks that every entry's span fits in the table
    pub fn check_entries(&self, entries: &[TocEntry]) -> Result<()> {
        for (index, entry) in entries.iter().enumerate() {
            let span = entry.block_span(self.block_size);
            if span.end > self.sizes.len() as u64 {
                return Err(Error::StructuralMismatch(format!(
                    "entry {} needs blocks {}..{} but the table has {}",
                    index,
                    span.start,
                    span.end,
                    self.sizes.len()
                )));
            }
        }
        Ok(())
    }
}

fn stored_len(raw: u32, block_size: u32) -> u64 {
    if raw == 0 {
        block_size as u64
    } else {
        raw as u64
    }
}
