//! Name digests stored in the TOC.

use crate::format::ArchiveFlags;
use md5::{Digest, Md5};

/// MD5 of `path` the way the archive hashed it.
///
/// Archives flagged ignore-case hash the ASCII upper-cased path.
pub fn name_digest(path: &str, flags: ArchiveFlags) -> [u8; 16] {
    let mut hasher = Md5::new();
    if flags.ignore_case() {
        hasher.update(path.to_ascii_uppercase().as_bytes());
    } else {
        hasher.update(path.as_bytes());
    }
    hasher.finalize().into()
}
