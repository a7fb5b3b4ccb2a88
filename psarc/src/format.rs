//! PSArc format constants and layout tables.

//    PSArc structure (all integers big-endian)
//    |magic 'PSAR' 4
//    |major_version 2
//    |minor_version 2
//    |compression_type 4 //'zlib' or 'lzma'
//    |toc_length 4 //header + toc entries + block size table
//    |toc_entry_size 4
//    |toc_entry_count 4
//    |block_size 4
//    |archive_flags 4
//    |toc_entries[]
//      |name_digest 16 //md5 of the path, entry 0 is the manifest
//      |block_index_start 4
//      |decompressed_length 5
//      |payload_offset 5 //absolute
//    |block_sizes[] 2, 3 or 4 //width picked by block_size, 0 = full raw block
//    |payloads //starts at toc_length

use crate::error::{Error, Result};

/// PSArc magic number
pub const PSAR_MAGIC: &[u8; 4] = b"PSAR";

/// `PSAR` read as a big-endian u32
pub const PSAR_MAGIC_U32: u32 = u32::from_be_bytes(*PSAR_MAGIC);

/// Size of the fixed header in bytes
pub const HEADER_SIZE: u64 = 32;

/// Size of one TOC record: digest + block index + length + offset
pub const TOC_ENTRY_SIZE: u32 = 16 + 4 + 5 + 5;

/// Upper bound on buffers sized from lengths stored in the archive
pub const MAX_PREALLOC: usize = 1 << 20;

/// Width of one block size table element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockWidth {
    U16,
    U24,
    U32,
}

/// The only block sizes the format defines, and the table width each selects
const BLOCK_WIDTHS: [(u32, BlockWidth); 3] = [
    (65536, BlockWidth::U16),
    (16777216, BlockWidth::U24),
    (4294967295, BlockWidth::U32),
];

impl BlockWidth {
    /// Looks up the table width for a header block size
    pub fn for_block_size(block_size: u32) -> Result<Self> {
        BLOCK_WIDTHS
            .iter()
            .find(|(size, _)| *size == block_size)
            .map(|(_, width)| *width)
            .ok_or(Error::UnsupportedBlockSize(block_size))
    }

    /// Element width in bytes
    pub fn bytes(self) -> u64 {
        match self {
            BlockWidth::U16 => 2,
            BlockWidth::U24 => 3,
            BlockWidth::U32 => 4,
        }
    }
}

/// Archive-wide flags stored in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArchiveFlags(pub u32);

impl ArchiveFlags {
    /// Paths are upper-cased before hashing
    pub const IGNORE_CASE: u32 = 0x1;
    /// Manifest paths are absolute
    pub const ABSOLUTE_PATHS: u32 = 0x2;

    pub fn ignore_case(self) -> bool {
        self.0 & Self::IGNORE_CASE != 0
    }

    pub fn absolute_paths(self) -> bool {
        self.0 & Self::ABSOLUTE_PATHS != 0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}
