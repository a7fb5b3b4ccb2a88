//! Fixed 32-byte archive header.

use crate::codec::CompressionType;
use crate::cursor::BeCursor;
use crate::error::{Error, Result};
use crate::format::{ArchiveFlags, BlockWidth, HEADER_SIZE, PSAR_MAGIC_U32, TOC_ENTRY_SIZE};
use std::io::Read;

/// Decoded archive header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub major_version: u16,
    pub minor_version: u16,
    pub compression_type: CompressionType,
    /// Bytes covered by header, TOC and block size table
    pub toc_length: u32,
    pub toc_entry_size: u32,
    pub toc_entry_count: u32,
    /// Nominal decompressed size of one block
    pub block_size: u32,
    pub archive_flags: ArchiveFlags,
    /// Block size table element width selected by `block_size`
    pub block_width: BlockWidth,
}

impl ArchiveHeader {
    /// Parses the header from a cursor at offset 0.
    ///
    /// The magic is checked before anything past it is read.
    pub fn parse<R: Read>(cursor: &mut BeCursor<R>) -> Result<Self> {
        let magic = cursor.read_u32()?;
        if magic != PSAR_MAGIC_U32 {
            return Err(Error::InvalidMagic { found: magic });
        }

        let major_version = cursor.read_u16()?;
        let minor_version = cursor.read_u16()?;
        let compression_type = CompressionType(cursor.read_u32()?);
        let toc_length = cursor.read_u32()?;
        let toc_entry_size = cursor.read_u32()?;
        let toc_entry_count = cursor.read_u32()?;
        let block_size = cursor.read_u32()?;
        let archive_flags = ArchiveFlags(cursor.read_u32()?);

        let block_width = BlockWidth::for_block_size(block_size)?;

        Ok(Self {
            major_version,
            minor_version,
            compression_type,
            toc_length,
            toc_entry_size,
            toc_entry_count,
            block_size,
            archive_flags,
            block_width,
        })
    }

    /// Offset of the first byte after the TOC records
    pub fn toc_end(&self) -> u64 {
        HEADER_SIZE + self.toc_entry_count as u64 * TOC_ENTRY_SIZE as u64
    }

    /// Format version as "major.minor"
    pub fn version(&self) -> String {
        format!("{}.{}", self.major_version, self.minor_version)
    }
}
