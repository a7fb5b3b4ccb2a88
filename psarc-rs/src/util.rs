use anyhow::{Result, anyhow};
use psarc::format::PSAR_MAGIC;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub fn is_psarc_from_filename(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("psarc"))
}

/// Checks the leading magic for inputs without a `.psarc` extension
pub fn has_psarc_magic(path: &Path) -> bool {
    let mut magic = [0u8; 4];
    File::open(path)
        .and_then(|mut file| file.read_exact(&mut magic))
        .is_ok_and(|_| &magic == PSAR_MAGIC)
}

pub fn glob_expand(input: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(input)?.collect::<Result<Vec<_>, _>>()?;
    if paths.is_empty() {
        return Err(anyhow!("No files found matching pattern: '{}'", input));
    }
    Ok(paths)
}

/// Extracts the base name of a file without the ".psarc" extension.
///
/// Names without the extension are returned unchanged.
pub fn get_psarc_basename(input: &Path) -> Result<String> {
    let name = input
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("Failed to get file name"))?;
    if is_psarc_from_filename(input) {
        if let Some(stem) = input.file_stem().and_then(|s| s.to_str()) {
            return Ok(stem.to_string());
        }
    }
    Ok(name.to_string())
}

/// `dir/songs.psarc` -> `dir/songs`
pub fn get_psarc_basepath(input: &Path) -> Result<PathBuf> {
    if !is_psarc_from_filename(input) {
        return Err(anyhow!("Not a .psarc file name: {:?}", input));
    }
    Ok(input.with_extension(""))
}

/// Sorts drag-and-drop style inputs, accepting only PSArc archives
pub fn process_cli_inputs(inputs: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    if inputs.is_empty() {
        return Err(anyhow!("No input provided"));
    }

    let mut archives = Vec::with_capacity(inputs.len());
    for input in inputs {
        if !input.exists() {
            return Err(anyhow!("Input path does not exist: {:?}", input));
        }
        if input.is_file() && (is_psarc_from_filename(&input) || has_psarc_magic(&input)) {
            archives.push(input);
        } else {
            return Err(anyhow!("Not a PSArc archive: {:?}", input));
        }
    }
    Ok(archives)
}
