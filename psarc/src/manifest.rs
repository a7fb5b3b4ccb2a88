//! Name resolution from the manifest entry.
//!
//! Entry 0 of every archive holds a newline-separated list of paths, one per
//! remaining entry in TOC order. Resolution is a pure step from the raw TOC
//! and the decoded manifest bytes to named entries; nothing is renamed in
//! place.

use crate::entry::PsarcEntry;
use crate::error::{Error, Result};
use crate::toc::TocEntry;
use log::warn;
use std::collections::HashSet;

/// Named entries plus the condition that forced synthetic names, if any
#[derive(Debug)]
pub struct Resolution {
    /// Entries 1.. in TOC order
    pub entries: Vec<PsarcEntry>,
    pub warning: Option<Error>,
}

/// Splits manifest bytes into paths.
///
/// Accepts `\n` and `\r\n`, drops trailing empty lines and a leading BOM.
pub fn parse_lines(bytes: &[u8]) -> Result<Vec<String>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|err| Error::ManifestUnreadable(format!("manifest is not UTF-8: {err}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    Ok(lines)
}

/// Names every entry after the manifest.
///
/// `manifest` is the decoded content of entry 0, or the error hit while
/// decoding it. Any failure falls back to digest names and is returned as
/// the warning instead of an error.
pub fn resolve(toc: &[TocEntry], manifest: Result<Vec<u8>>) -> Resolution {
    if toc.len() <= 1 {
        return Resolution {
            entries: Vec::new(),
            warning: None,
        };
    }
    let expected = toc.len() - 1;

    let lines = manifest.and_then(|bytes| parse_lines(&bytes));
    let warning = match lines {
        Ok(lines) if lines.len() == expected => {
            return Resolution {
                entries: named(toc, lines),
                warning: None,
            };
        }
        Ok(lines) => Error::ManifestMismatch {
            expected,
            found: lines.len(),
        },
        Err(err @ Error::ManifestUnreadable(_)) => err,
        Err(err) => Error::ManifestUnreadable(err.to_string()),
    };

    warn!("{warning}; falling back to digest names");
    Resolution {
        entries: synthetic(toc),
        warning: Some(warning),
    }
}

fn named(toc: &[TocEntry], lines: Vec<String>) -> Vec<PsarcEntry> {
    toc.iter()
        .enumerate()
        .skip(1)
        .zip(lines)
        .map(|((index, raw), name)| PsarcEntry::new(index, name, *raw, false))
        .collect()
}

/// Lowercase hex of each digest, suffixed with `~index` on collisions
pub fn synthetic(toc: &[TocEntry]) -> Vec<PsarcEntry> {
    let mut seen = HashSet::new();
    toc.iter()
        .enumerate()
        .skip(1)
        .map(|(index, raw)| {
            let mut name = hex::encode(raw.name_digest);
            if !seen.insert(name.clone()) {
                name = format!("{name}~{index}");
            }
            PsarcEntry::new(index, name, *raw, true)
        })
        .collect()
}
