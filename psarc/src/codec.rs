//! Per-block decompressors, keyed by the header's codec id.

use crate::format::MAX_PREALLOC;
use flate2::read::ZlibDecoder;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

/// Codec id from the archive header, a big-endian four-character code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressionType(pub u32);

impl CompressionType {
    pub const ZLIB: CompressionType = CompressionType(u32::from_be_bytes(*b"zlib"));
    pub const LZMA: CompressionType = CompressionType(u32::from_be_bytes(*b"lzma"));

    pub fn fourcc(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.fourcc();
        if code.iter().all(|b| b.is_ascii_graphic()) {
            write!(f, "{}", code.iter().map(|&b| b as char).collect::<String>())
        } else {
            write!(f, "{:#010x}", self.0)
        }
    }
}

/// Decodes one compressed block
pub trait Decompressor: Send + Sync {
    /// Decompresses `data`, which should expand to `expected_len` bytes
    fn decompress(&self, data: &[u8], expected_len: usize) -> io::Result<Vec<u8>>;
}

/// zlib-wrapped DEFLATE
#[derive(Debug, Default, Clone, Copy)]
pub struct ZlibDecompressor;

impl Decompressor for ZlibDecompressor {
    fn decompress(&self, data: &[u8], expected_len: usize) -> io::Result<Vec<u8>> {
        let mut output = Vec::with_capacity(expected_len.min(MAX_PREALLOC));
        // One byte past the expected length is enough to detect overlong blocks
        ZlibDecoder::new(data)
            .take((expected_len as u64).saturating_add(1))
            .read_to_end(&mut output)?;
        Ok(output)
    }
}

/// LZMA "alone" streams (13-byte header followed by the raw stream)
#[cfg(feature = "lzma")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LzmaDecompressor;

#[cfg(feature = "lzma")]
impl Decompressor for LzmaDecompressor {
    fn decompress(&self, data: &[u8], expected_len: usize) -> io::Result<Vec<u8>> {
        let mut output = Vec::with_capacity(expected_len.min(MAX_PREALLOC));
        lzma_rs::lzma_decompress(&mut &data[..], &mut output)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
        Ok(output)
    }
}

/// Registry of decompressors available to an archive
#[derive(Clone)]
pub struct Codecs {
    table: HashMap<CompressionType, Arc<dyn Decompressor>>,
}

impl Codecs {
    /// A registry with nothing registered
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: CompressionType, codec: Arc<dyn Decompressor>) {
        self.table.insert(kind, codec);
    }

    pub fn get(&self, kind: CompressionType) -> Option<Arc<dyn Decompressor>> {
        self.table.get(&kind).cloned()
    }

    pub fn supports(&self, kind: CompressionType) -> bool {
        self.table.contains_key(&kind)
    }
}

impl Default for Codecs {
    fn default() -> Self {
        let mut codecs = Self::empty();
        codecs.register(CompressionType::ZLIB, Arc::new(ZlibDecompressor));
        #[cfg(feature = "lzma")]
        codecs.register(CompressionType::LZMA, Arc::new(LzmaDecompressor));
        codecs
    }
}

impl fmt::Debug for Codecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.table.keys()).finish()
    }
}
