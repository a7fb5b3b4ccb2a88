// Library interface for psarc-rs
// This allows tests to use the path helpers of the binary

pub mod util;

use std::path::{Path, PathBuf};

/// Determine output directory for extraction
pub fn determine_extract_output(
    input: &Path,
    specified_output: Option<&Path>,
    separate: bool,
) -> PathBuf {
    if let Some(output) = specified_output {
        if separate {
            // Each archive gets its own subdirectory under the output
            let name = util::get_psarc_basename(input).unwrap_or_else(|_| "archive".to_string());
            output.join(name)
        } else {
            output.to_path_buf()
        }
    } else {
        // Auto-detect: extract next to the archive, named after it
        util::get_psarc_basepath(input).unwrap_or_else(|_| {
            let stripped = input.with_extension("");
            if stripped == input {
                // Cannot reuse the archive's own path as a directory
                input.with_extension("extracted")
            } else {
                stripped
            }
        })
    }
}
