//! Display functionality for PSArc archives (requires 'display' feature).

use crate::archive::PsarcArchive;
use crate::entry::PsarcEntry;
use crate::error::Result;
use std::fmt;
use std::path::Path;

use human_bytes::human_bytes;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tabled::{Table, Tabled};

/// Represents a file entry for display purposes
#[derive(Tabled)]
pub struct DisplayEntry {
    #[tabled(rename = "File")]
    pub name: String,
    #[tabled(rename = "Size", display = "Self::format_size")]
    pub size: u64,
}

impl DisplayEntry {
    fn format_size(size: &u64) -> String {
        human_bytes(*size as f64)
    }

    pub fn from_entry(entry: &PsarcEntry) -> Self {
        Self {
            name: entry.name().to_string(),
            size: entry.size(),
        }
    }
}

/// Represents a list of files in a PSArc archive for display
pub struct FileList {
    entries: Vec<DisplayEntry>,
}

impl FileList {
    pub fn new(entries: Vec<DisplayEntry>) -> Self {
        Self { entries }
    }

    pub fn from_archive(archive: &PsarcArchive) -> Self {
        let entries = archive.entries().map(DisplayEntry::from_entry).collect();
        Self { entries }
    }
}

impl fmt::Display for FileList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "Archive is empty");
        }

        let mut table = Table::new(&self.entries);
        table.with(Style::markdown());
        table.modify(Columns::last(), Alignment::right());

        let total_size: u64 = self.entries.iter().map(|e| e.size).sum();
        let footer = format!(
            "Total: {} files, Total size: {}",
            self.entries.len(),
            human_bytes(total_size as f64)
        );

        write!(f, "{table}\n\n{footer}")
    }
}

/// Lists the contents of a PSArc archive in a formatted table
pub fn list_archive<P: AsRef<Path>>(archive_path: P) -> Result<()> {
    let archive = PsarcArchive::open(&archive_path)?;
    let file_list = FileList::from_archive(&archive);

    println!("{}", archive_path.as_ref().display());
    println!();
    println!("{file_list}");

    Ok(())
}
