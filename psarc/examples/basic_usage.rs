//! Example program demonstrating the psarc library usage
//!
//! Run with: cargo run --example basic_usage -- path/to/songs.psarc

use psarc::{ArchiveHandler, ControlAction, FileSystem, ProgressInfo, PsarcArchive, Result};
use std::io::{Read, Seek, SeekFrom};

struct PrintProgress;

impl ArchiveHandler for PrintProgress {
    fn on_progress(&mut self, progress: &ProgressInfo) -> ControlAction {
        println!(
            "   [{:5.1}%] {}",
            progress.overall_progress(),
            progress.current_file
        );
        ControlAction::Continue
    }
}

fn main() -> Result<()> {
    let Some(archive_path) = std::env::args().nth(1) else {
        eprintln!("usage: basic_usage <archive.psarc>");
        return Ok(());
    };

    println!("=== psarc Library Example ===\n");

    // Example 1: Reading archive information
    println!("1. Reading archive information...");
    let archive = PsarcArchive::open(&archive_path)?;
    let header = archive.header();
    println!(
        "   v{} {} archive, {} byte blocks, {} files",
        header.version(),
        header.compression_type,
        header.block_size,
        archive.len()
    );
    for warning in archive.warnings() {
        println!("   warning: {warning}");
    }

    // Example 2: Random access into the first entry
    if let Some(entry) = archive.entries().next() {
        println!("\n2. Reading the tail of {}...", entry.name());
        let mut reader = archive.open_entry_at(entry);
        reader.seek(SeekFrom::End(-(entry.size().min(16) as i64)))?;
        let mut tail = Vec::new();
        reader.read_to_end(&mut tail)?;
        println!("   last {} bytes: {:02x?}", tail.len(), tail);
    }

    // Example 3: Extracting with progress
    let output_dir = std::env::temp_dir().join("psarc_example");
    println!("\n3. Extracting to {}...", output_dir.display());
    archive.extract_all_with_progress(&output_dir, &mut PrintProgress)?;

    // Example 4: The read-only filesystem view
    println!("\n4. Browsing as a filesystem...");
    let fs = archive.into_filesystem();
    for path in fs.list_entries("").take(10) {
        println!("   - {path} ({} bytes)", fs.file_length(path)?);
    }
    if let Err(err) = fs.delete_file("anything") {
        println!("   delete_file: {err}");
    }

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
