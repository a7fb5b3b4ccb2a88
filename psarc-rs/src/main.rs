use anyhow::{Result, anyhow};
use clap::CommandFactory;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use psarc::{self, ArchiveHandler, ControlAction, OpenOptions, PsarcArchive};
use psarc_rs::{determine_extract_output, util};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Inspect and unpack PlayStation PSArc archives
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Change to directory before performing operations
    #[arg(short = 'C', long = "directory", global = true)]
    directory: Option<PathBuf>,
    /// Quiet mode (no progress output)
    #[arg(short = 'q', long = "quiet", global = true, default_value_t = false)]
    quiet: bool,
    /// Verbose mode (show detailed information)
    #[arg(short = 'v', long = "verbose", global = true, default_value_t = false)]
    verbose: bool,
    /// Decoded blocks cached per open entry (0 disables the cache)
    #[arg(long, value_name = "N", global = true, default_value_t = psarc::options::DEFAULT_CACHE_BLOCKS)]
    cache_blocks: usize,
    /// Input file use for drag-in
    #[arg(hide = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract files from psarc archive(s).
    ///
    /// If output is not specified, each archive is extracted to a directory
    /// named after it, next to the archive.
    #[command(visible_alias = "x", alias = "unpack", alias = "u")]
    Extract {
        /// Input psarc file(s), can be a glob pattern
        input: String,
        /// Output directory (optional, default: auto-detect)
        output: Option<PathBuf>,
        /// Extract each archive to separate directories
        #[arg(short = 's', long, default_value_t = false)]
        separate: bool,
    },
    /// List contents of psarc archive
    #[command(visible_alias = "l", alias = "ls")]
    List {
        /// Input psarc file
        input: PathBuf,
        /// Show detailed information
        #[arg(short = 'l', long, default_value_t = false)]
        long: bool,
    },
    /// Write one entry's content to stdout
    Cat {
        /// Input psarc file
        input: PathBuf,
        /// Entry path exactly as listed
        entry: String,
    },
    /// Show header fields and index statistics
    Info {
        /// Input psarc file
        input: PathBuf,
    },
    /// Check every entry name against its stored digest
    Verify {
        /// Input psarc file
        input: PathBuf,
    },
}

fn open_archive(path: &Path, cache_blocks: usize) -> Result<PsarcArchive> {
    let mut options = OpenOptions::new();
    options.block_cache_blocks(cache_blocks);
    let archive = PsarcArchive::open_with_options(path, &options)?;
    for warning in archive.warnings() {
        warn!("{}: {warning}", path.display());
    }
    Ok(archive)
}

fn command_unpack_paths(
    paths: &[PathBuf],
    output: Option<&Path>,
    separate: bool,
    quiet: bool,
    cache_blocks: usize,
) -> Result<()> {
    for path in paths {
        let output_path = determine_extract_output(path, output, separate);
        fs::create_dir_all(&output_path)?;
        info!("Extracting {:?} to {:?}", path, output_path);

        let archive = open_archive(path, cache_blocks)?;

        if quiet {
            let mut handler = psarc::NoOpHandler;
            archive.extract_all_with_progress(&output_path, &mut handler)?;
        } else {
            let mut handler = ProgressHandler::new();
            archive.extract_all_with_progress(&output_path, &mut handler)?;

            let total_bytes = archive.entries().map(|entry| entry.size()).sum();
            handler.print_summary(total_bytes);
        }
    }
    Ok(())
}

fn command_list(input: &Path, long: bool, cache_blocks: usize) -> Result<()> {
    let archive = open_archive(input, cache_blocks)?;

    if !long {
        for entry in archive.entries() {
            println!("{}", entry.name());
        }
        return Ok(());
    }

    println!("{}", input.display());
    println!();

    #[cfg(feature = "display")]
    {
        println!("{}", psarc::display::FileList::from_archive(&archive));
    }

    #[cfg(not(feature = "display"))]
    {
        for entry in archive.entries() {
            println!("{}: {} bytes", entry.name(), entry.size());
        }
    }

    Ok(())
}

fn command_cat(input: &Path, entry: &str, cache_blocks: usize) -> Result<()> {
    let archive = open_archive(input, cache_blocks)?;
    let mut reader = archive.open_entry(entry)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    io::copy(&mut reader, &mut out)?;
    out.flush()?;
    Ok(())
}

fn command_info(input: &Path, cache_blocks: usize) -> Result<()> {
    let archive = open_archive(input, cache_blocks)?;
    let header = archive.header();
    let total_bytes: u64 = archive.entries().map(|entry| entry.size()).sum();

    println!("{}", input.display());
    println!();
    println!("Version:         {}", header.version());
    println!("Compression:     {}", header.compression_type);
    println!("Block size:      {}", header.block_size);
    println!("Table width:     {} bytes", header.block_width.bytes());
    println!("Archive flags:   {:#x}", header.archive_flags.bits());
    println!("  ignore case:   {}", header.archive_flags.ignore_case());
    println!("  absolute:      {}", header.archive_flags.absolute_paths());
    println!("TOC length:      {}", header.toc_length);
    println!("TOC entries:     {}", header.toc_entry_count);
    println!("Blocks:          {}", archive.block_table().len());
    println!("Files:           {}", archive.len());
    println!("Total size:      {total_bytes}");
    println!(
        "Names:           {}",
        if archive.has_synthetic_names() {
            "digest"
        } else {
            "manifest"
        }
    );
    for warning in archive.warnings() {
        println!("Warning:         {warning}");
    }
    Ok(())
}

fn command_verify(input: &Path, cache_blocks: usize) -> Result<()> {
    let archive = open_archive(input, cache_blocks)?;
    if archive.has_synthetic_names() {
        warn!("Names were derived from digests and cannot be verified");
    }

    let mismatched = archive.verify_names();
    for entry in &mismatched {
        println!("MISMATCH {} ({})", entry.name(), entry.index());
    }
    if !mismatched.is_empty() {
        return Err(anyhow!(
            "{} of {} entries do not match their digest",
            mismatched.len(),
            archive.len()
        ));
    }

    info!("All {} entries match their digest", archive.len());
    Ok(())
}

/// Progress handler that collects statistics and prints progress
struct ProgressHandler {
    start_time: Instant,
    total_files: usize,
}

impl ProgressHandler {
    fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_files: 0,
        }
    }

    fn print_summary(&self, total_bytes: u64) {
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();
        let speed = if elapsed_secs > 0.0 {
            total_bytes as f64 / elapsed_secs / 1024.0 / 1024.0
        } else {
            0.0
        };

        info!(
            "Done: Time: {:.2}s, Files: {}, Size: {:.2} MB, Speed: {:.2} MB/s",
            elapsed_secs,
            self.total_files,
            total_bytes as f64 / 1024.0 / 1024.0,
            speed
        );
    }
}

impl ArchiveHandler for ProgressHandler {
    fn on_entry_started(&mut self, name: &str) -> ControlAction {
        self.total_files += 1;
        info!("Processing: {}", name);
        ControlAction::Continue
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Args::parse();

    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)
            .map_err(|e| anyhow!("Failed to change directory to {:?}: {}", dir, e))?;
        info!("Changed working directory to {:?}", dir);
    }

    let quiet = cli.quiet;
    let cache_blocks = cli.cache_blocks;

    if cli.verbose && !quiet {
        log::set_max_level(log::LevelFilter::Debug);
    }

    match &cli.command {
        Some(Commands::Extract {
            input,
            output,
            separate,
        }) => {
            let files = util::glob_expand(input)?;
            command_unpack_paths(&files, output.as_deref(), *separate, quiet, cache_blocks)?;
        }
        Some(Commands::List { input, long }) => command_list(input, *long, cache_blocks)?,
        Some(Commands::Cat { input, entry }) => command_cat(input, entry, cache_blocks)?,
        Some(Commands::Info { input }) => command_info(input, cache_blocks)?,
        Some(Commands::Verify { input }) => command_verify(input, cache_blocks)?,
        None => {
            if cli.inputs.is_empty() {
                let mut cmd = Args::command();
                cmd.print_help()?;
            } else {
                let archives = util::process_cli_inputs(cli.inputs)?;
                command_unpack_paths(&archives, None, true, quiet, cache_blocks)?;
            }
        }
    }
    Ok(())
}
