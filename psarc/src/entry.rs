//! Resolved entry representation.

use crate::toc::TocEntry;
use std::path::Path;

/// A file entry in a PSArc archive with its resolved path
#[derive(Debug, Clone)]
pub struct PsarcEntry {
    /// Position in the TOC
    index: usize,
    /// Path as listed in the manifest, or a digest name
    name: String,
    raw: TocEntry,
    /// Whether `name` was derived from the digest
    synthetic: bool,
}

impl PsarcEntry {
    pub(crate) fn new(index: usize, name: String, raw: TocEntry, synthetic: bool) -> Self {
        Self {
            index,
            name,
            raw,
            synthetic,
        }
    }

    /// Gets the path within the archive, exactly as stored
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the path as a `Path`
    pub fn path(&self) -> &Path {
        Path::new(&self.name)
    }

    /// Gets the file name
    pub fn file_name(&self) -> Option<&str> {
        self.path().file_name().and_then(|os_str| os_str.to_str())
    }

    /// Gets the decompressed size in bytes
    pub fn size(&self) -> u64 {
        self.raw.decompressed_length
    }

    /// Gets the TOC index of this entry
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn digest(&self) -> &[u8; 16] {
        &self.raw.name_digest
    }

    /// Gets the raw TOC record
    pub fn toc(&self) -> &TocEntry {
        &self.raw
    }

    /// Returns whether the name came from the digest instead of the manifest
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }
}

impl PartialEq for PsarcEntry {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.name == other.name
    }
}

impl Eq for PsarcEntry {}

impl std::hash::Hash for PsarcEntry {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.name.hash(state);
    }
}
