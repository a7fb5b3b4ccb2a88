//! In-memory PSArc writer used to build test archives.
#![allow(dead_code)]

use flate2::Compression;
use flate2::write::ZlibEncoder;
use md5::{Digest, Md5};
use std::io::Write;

pub const HEADER_SIZE: usize = 32;
pub const ENTRY_SIZE: usize = 30;

/// Builds a complete archive: manifest at entry 0, then one entry per file
pub struct Fixture {
    block_size: u32,
    files: Vec<(String, Vec<u8>)>,
    compress: bool,
    manifest: Option<Vec<u8>>,
    flags: u32,
    compression: [u8; 4],
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            block_size: 65536,
            files: Vec::new(),
            compress: true,
            manifest: None,
            flags: 0,
            compression: *b"zlib",
        }
    }

    pub fn block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn file(mut self, name: &str, data: Vec<u8>) -> Self {
        self.files.push((name.to_string(), data));
        self
    }

    /// Store every block raw when false
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Replace the generated manifest content
    pub fn manifest(mut self, manifest: &[u8]) -> Self {
        self.manifest = Some(manifest.to_vec());
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Codec id written to the header; blocks are still zlib
    pub fn compression(mut self, compression: &[u8; 4]) -> Self {
        self.compression = *compression;
        self
    }

    pub fn width(&self) -> usize {
        match self.block_size {
            65536 => 2,
            16777216 => 3,
            _ => 4,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let manifest = self.manifest.clone().unwrap_or_else(|| {
            self.files
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join("\n")
                .into_bytes()
        });

        let mut contents: Vec<([u8; 16], &[u8])> = vec![([0u8; 16], manifest.as_slice())];
        for (name, data) in &self.files {
            contents.push((digest(name, self.flags), data.as_slice()));
        }

        let mut sizes: Vec<u32> = Vec::new();
        let mut payload: Vec<u8> = Vec::new();
        let mut records: Vec<(usize, u64, u64)> = Vec::new();

        for (_, data) in &contents {
            records.push((sizes.len(), data.len() as u64, payload.len() as u64));
            for chunk in data.chunks(self.block_size as usize) {
                let packed = if self.compress { zlib(chunk) } else { Vec::new() };
                if self.compress && packed.len() < chunk.len() {
                    sizes.push(packed.len() as u32);
                    payload.extend_from_slice(&packed);
                } else {
                    let full = chunk.len() as u64 == self.block_size as u64;
                    sizes.push(if full { 0 } else { chunk.len() as u32 });
                    payload.extend_from_slice(chunk);
                }
            }
        }

        let width = self.width();
        let toc_length = HEADER_SIZE + contents.len() * ENTRY_SIZE + sizes.len() * width;

        let mut out = Vec::with_capacity(toc_length + payload.len());
        out.extend_from_slice(b"PSAR");
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&4u16.to_be_bytes());
        out.extend_from_slice(&self.compression);
        out.extend_from_slice(&(toc_length as u32).to_be_bytes());
        out.extend_from_slice(&(ENTRY_SIZE as u32).to_be_bytes());
        out.extend_from_slice(&(contents.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.block_size.to_be_bytes());
        out.extend_from_slice(&self.flags.to_be_bytes());

        for ((digest, _), (block_start, length, offset)) in contents.iter().zip(&records) {
            out.extend_from_slice(digest);
            out.extend_from_slice(&(*block_start as u32).to_be_bytes());
            out.extend_from_slice(&length.to_be_bytes()[3..]);
            out.extend_from_slice(&(toc_length as u64 + offset).to_be_bytes()[3..]);
        }
        for size in &sizes {
            out.extend_from_slice(&size.to_be_bytes()[4 - width..]);
        }
        out.extend_from_slice(&payload);
        out
    }
}

/// MD5 of an archive path, upper-cased for ignore-case archives
pub fn digest(name: &str, flags: u32) -> [u8; 16] {
    let name = if flags & 1 != 0 {
        name.to_ascii_uppercase()
    } else {
        name.to_string()
    };
    Md5::digest(name.as_bytes()).into()
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Deterministic bytes that still compress
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Patches a big-endian u32 in place
pub fn set_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

pub fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
