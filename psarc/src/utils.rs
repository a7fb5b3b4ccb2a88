//! Utility functions for path handling.

use std::path::PathBuf;

/// Converts an archive path to a relative output path.
///
/// Both separators are accepted. Empty, `.` and `..` components are dropped
/// so the result always stays below the extraction root. Returns `None`
/// when nothing is left.
pub fn archive_path_to_relative(name: &str) -> Option<PathBuf> {
    let path: PathBuf = name
        .split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .filter(|part| !part.contains(':'))
        .collect();
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

/// Normalizes a directory prefix for matching: empty stays empty, anything
/// else ends with exactly one `/`
pub fn directory_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}
