//! Configuration applied when an archive is opened.

use crate::codec::{Codecs, CompressionType, Decompressor};
use std::sync::Arc;

/// Default number of decoded blocks each open handle keeps
pub const DEFAULT_CACHE_BLOCKS: usize = 16;

/// Options for opening a PSArc archive
#[derive(Debug, Clone)]
pub struct OpenOptions {
    pub(crate) cache_blocks: usize,
    pub(crate) codecs: Codecs,
    pub(crate) strict_manifest: bool,
}

impl OpenOptions {
    /// Creates options with the default codecs and cache size
    pub fn new() -> Self {
        Self {
            cache_blocks: DEFAULT_CACHE_BLOCKS,
            codecs: Codecs::default(),
            strict_manifest: false,
        }
    }

    /// Sets how many decoded blocks each handle caches; 0 disables caching
    pub fn block_cache_blocks(&mut self, blocks: usize) -> &mut Self {
        self.cache_blocks = blocks;
        self
    }

    /// Registers or replaces the decompressor for a codec id
    pub fn codec(&mut self, kind: CompressionType, codec: Arc<dyn Decompressor>) -> &mut Self {
        self.codecs.register(kind, codec);
        self
    }

    /// Makes a manifest mismatch fail the open instead of degrading names
    pub fn strict_manifest(&mut self, strict: bool) -> &mut Self {
        self.strict_manifest = strict;
        self
    }

    pub fn cache_blocks(&self) -> usize {
        self.cache_blocks
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::new()
    }
}
