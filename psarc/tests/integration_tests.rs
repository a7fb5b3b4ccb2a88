//! Tests for the PSArc library

mod common;

use common::{Fixture, pattern, read_u32, set_u32};
use psarc::codec::ZlibDecompressor;
use psarc::*;
use std::fs;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const BS: usize = 65536;

fn open(bytes: Vec<u8>) -> PsarcArchive {
    PsarcArchive::from_source(bytes, &OpenOptions::default()).unwrap()
}

fn open_err(bytes: Vec<u8>) -> Error {
    match PsarcArchive::from_source(bytes, &OpenOptions::default()) {
        Ok(_) => panic!("expected the open to fail"),
        Err(err) => err,
    }
}

#[test]
fn test_read_compressed_archive() {
    let archive = open(
        Fixture::new()
            .file("songs/intro.ogg", pattern(BS * 2 + 17))
            .file("readme.txt", b"Hello, World!".to_vec())
            .build(),
    );

    assert_eq!(archive.len(), 2);
    assert!(archive.warnings().is_empty());
    assert!(!archive.has_synthetic_names());
    assert_eq!(archive.read_file("readme.txt").unwrap(), b"Hello, World!");
    assert_eq!(
        archive.read_file("songs/intro.ogg").unwrap(),
        pattern(BS * 2 + 17)
    );

    let header = archive.header();
    assert_eq!(header.toc_entry_count, 3);
    assert_eq!(header.compression_type, CompressionType::ZLIB);
    // manifest 1 block + 3 + 1
    assert_eq!(archive.block_table().len(), 5);
    assert_eq!(header.toc_length as u64, 32 + 3 * 30 + 5 * 2);
}

#[test]
fn test_toc_length_must_match_layout() {
    let bytes = Fixture::new().file("a", b"abc".to_vec()).build();

    let mut odd = bytes.clone();
    set_u32(&mut odd, 12, read_u32(&bytes, 12) + 1);
    assert!(matches!(open_err(odd), Error::StructuralMismatch(_)));

    let mut short = bytes.clone();
    set_u32(&mut short, 12, 32 + 30);
    assert!(matches!(open_err(short), Error::StructuralMismatch(_)));

    let mut entry_size = bytes;
    set_u32(&mut entry_size, 16, 24);
    assert!(matches!(open_err(entry_size), Error::StructuralMismatch(_)));
}

#[test]
fn test_invalid_magic() {
    let mut bytes = Fixture::new().file("a", b"abc".to_vec()).build();
    bytes[..4].copy_from_slice(b"PSAX");
    match open_err(bytes) {
        Error::InvalidMagic { found } => assert_eq!(found, u32::from_be_bytes(*b"PSAX")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_unsupported_block_size() {
    let mut bytes = Fixture::new().file("a", b"abc".to_vec()).build();
    set_u32(&mut bytes, 24, 4096);
    assert!(matches!(open_err(bytes), Error::UnsupportedBlockSize(4096)));
}

#[test]
fn test_truncated_toc() {
    let bytes = Fixture::new().file("a", b"abc".to_vec()).build();
    assert!(matches!(
        open_err(bytes[..40].to_vec()),
        Error::Truncated { .. }
    ));
}

/// Header, TOC and table for an archive whose manifest claims 2^40 - 1 bytes
/// spread over 257 blocks of the largest block size, plus one 5-byte file.
fn oversized_manifest(slot: u32) -> Vec<u8> {
    let manifest_blocks = 257u32;
    let toc_length = 32 + 2 * 30 + (manifest_blocks + 1) * 4;
    let manifest_stored = if slot == 0 { 0 } else { manifest_blocks * slot };

    let mut out = Vec::new();
    out.extend_from_slice(b"PSAR");
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&4u16.to_be_bytes());
    out.extend_from_slice(b"zlib");
    out.extend_from_slice(&toc_length.to_be_bytes());
    out.extend_from_slice(&30u32.to_be_bytes());
    out.extend_from_slice(&2u32.to_be_bytes());
    out.extend_from_slice(&u32::MAX.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());

    out.extend_from_slice(&[0u8; 16]);
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&cursor::u40_to_be((1 << 40) - 1));
    out.extend_from_slice(&cursor::u40_to_be(toc_length as u64));

    out.extend_from_slice(&common::digest("tail.txt", 0));
    out.extend_from_slice(&manifest_blocks.to_be_bytes());
    out.extend_from_slice(&cursor::u40_to_be(5));
    out.extend_from_slice(&cursor::u40_to_be((toc_length + manifest_stored) as u64));

    for _ in 0..manifest_blocks {
        out.extend_from_slice(&slot.to_be_bytes());
    }
    out.extend_from_slice(&5u32.to_be_bytes());

    out.resize(out.len() + manifest_stored as usize, 0xAB);
    out.extend_from_slice(b"hello");
    out
}

#[test]
fn test_oversized_lengths_do_not_allocate_up_front() {
    // 10-byte compressed blocks, then zero slots meaning 4 GiB raw blocks
    for slot in [10, 0] {
        let bytes = oversized_manifest(slot);
        assert!(bytes.len() < 4096);

        let archive = open(bytes.clone());
        assert!(matches!(archive.warnings(), [Error::ManifestUnreadable(_)]));
        let name = hex::encode(common::digest("tail.txt", 0));
        assert_eq!(archive.read_file(&name).unwrap(), b"hello");

        let mut strict = OpenOptions::new();
        strict.strict_manifest(true);
        assert!(matches!(
            PsarcArchive::from_source(bytes, &strict),
            Err(Error::ManifestUnreadable(_))
        ));
    }
}

#[test]
fn test_single_entry_archive_skips_manifest() {
    let mut bytes = oversized_manifest(10);
    // Drop the file entry; the manifest alone is never decoded
    let toc_length = read_u32(&bytes, 12) - 30;
    set_u32(&mut bytes, 20, 1);
    set_u32(&mut bytes, 12, toc_length);
    bytes.drain(32 + 30..32 + 60);

    let archive = open(bytes);
    assert!(archive.is_empty());
    assert!(archive.warnings().is_empty());
}

#[test]
fn test_range_read_touches_covering_blocks_only() {
    let content = pattern(BS * 3 + 100);
    let archive = open(Fixture::new().file("big.bin", content.clone()).build());

    let entry = archive.get_entry("big.bin").unwrap();
    assert_eq!(entry.toc().block_count(BS as u32), 4);
    let first = entry.toc().block_index_start as u64;

    let mut reader = archive.open_entry("big.bin").unwrap();
    let start = (BS * 2 + 50) as u64;
    let end = (BS * 2 + 200) as u64;
    let data = reader.read_range(start, end).unwrap();

    assert_eq!(data.len(), 150);
    assert_eq!(data, content[start as usize..end as usize]);
    assert_eq!(reader.cached_blocks(), vec![first + 2, first + 3]);
    assert_eq!(reader.position(), 0);
}

#[test]
fn test_zero_table_value_is_full_raw_block() {
    let content = pattern(BS * 2 + 10);
    let archive = open(
        Fixture::new()
            .compress(false)
            .file("raw.bin", content.clone())
            .build(),
    );

    let entry = archive.get_entry("raw.bin").unwrap();
    let first = entry.toc().block_index_start as u64;
    let table = archive.block_table();
    assert_eq!(table.raw_size(first), Some(0));
    assert_eq!(table.raw_size(first + 1), Some(0));
    assert_eq!(table.raw_size(first + 2), Some(10));
    assert_eq!(table.stored_len(first), Some(BS as u64));

    assert_eq!(archive.read_file("raw.bin").unwrap(), content);
}

#[test]
fn test_manifest_naming_is_positional_and_exact() {
    let archive = open(
        Fixture::new()
            .file("Songs/A B.ogg", b"first".to_vec())
            .file("songs/a b.ogg", b"second".to_vec())
            .file("deep/nested/path/x", b"third".to_vec())
            .build(),
    );

    let names: Vec<&str> = archive.entries().map(PsarcEntry::name).collect();
    assert_eq!(names, vec!["Songs/A B.ogg", "songs/a b.ogg", "deep/nested/path/x"]);
    assert_eq!(archive.read_file("Songs/A B.ogg").unwrap(), b"first");
    assert_eq!(archive.read_file("songs/a b.ogg").unwrap(), b"second");
    assert!(!archive.contains("SONGS/A B.OGG"));

    let indices: Vec<usize> = archive.entries().map(PsarcEntry::index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
}

#[test]
fn test_manifest_with_crlf_and_trailing_newline() {
    let archive = open(
        Fixture::new()
            .file("a.txt", b"a".to_vec())
            .file("b.txt", b"b".to_vec())
            .manifest(b"a.txt\r\nb.txt\r\n")
            .build(),
    );
    assert!(archive.warnings().is_empty());
    assert_eq!(archive.read_file("b.txt").unwrap(), b"b");
}

#[test]
fn test_manifest_mismatch_degrades_to_digest_names() {
    let bytes = Fixture::new()
        .file("a.txt", b"alpha".to_vec())
        .file("b.txt", b"beta".to_vec())
        .manifest(b"a.txt")
        .build();
    let archive = open(bytes.clone());

    assert_eq!(archive.warnings().len(), 1);
    assert!(matches!(
        archive.warnings()[0],
        Error::ManifestMismatch {
            expected: 2,
            found: 1
        }
    ));
    assert!(archive.warnings()[0].is_warning());
    assert!(archive.has_synthetic_names());

    let synthetic = hex::encode(common::digest("b.txt", 0));
    assert!(archive.contains(&synthetic));
    assert_eq!(archive.read_file(&synthetic).unwrap(), b"beta");
    assert!(!archive.contains("a.txt"));

    let mut strict = OpenOptions::new();
    strict.strict_manifest(true);
    assert!(matches!(
        PsarcArchive::from_source(bytes, &strict),
        Err(Error::ManifestMismatch { .. })
    ));
}

#[test]
fn test_unreadable_manifest_degrades() {
    let archive = open(
        Fixture::new()
            .file("a.txt", b"alpha".to_vec())
            .manifest(&[0xFF, 0xFE, 0x00])
            .build(),
    );
    assert!(matches!(
        archive.warnings()[0],
        Error::ManifestUnreadable(_)
    ));
    assert_eq!(archive.len(), 1);
}

#[test]
fn test_archive_with_only_manifest() {
    let archive = open(Fixture::new().build());
    assert!(archive.is_empty());
    assert!(archive.warnings().is_empty());
    assert_eq!(archive.entries().count(), 0);
}

#[test]
fn test_empty_entry() {
    let archive = open(
        Fixture::new()
            .file("empty", Vec::new())
            .file("after", b"after".to_vec())
            .build(),
    );
    assert_eq!(archive.read_file("empty").unwrap(), b"");
    assert_eq!(archive.read_file("after").unwrap(), b"after");
    assert!(archive.open_entry("empty").unwrap().is_empty());
}

#[test]
fn test_wider_block_tables() {
    for (block_size, width) in [(16_777_216u32, 3u64), (u32::MAX, 4u64)] {
        let archive = open(
            Fixture::new()
                .block_size(block_size)
                .file("one.bin", pattern(1000))
                .file("two.bin", pattern(300_000))
                .build(),
        );
        assert_eq!(archive.header().block_width.bytes(), width);
        assert_eq!(archive.read_file("two.bin").unwrap(), pattern(300_000));
        assert_eq!(archive.read_file("one.bin").unwrap(), pattern(1000));
    }
}

#[test]
fn test_seek_and_read() {
    let content = pattern(BS + 500);
    let archive = open(Fixture::new().file("f", content.clone()).build());
    let mut reader = archive.open_entry("f").unwrap();

    reader.seek(SeekFrom::End(-10)).unwrap();
    let mut tail = Vec::new();
    reader.read_to_end(&mut tail).unwrap();
    assert_eq!(tail, content[content.len() - 10..]);

    reader.seek(SeekFrom::Start(BS as u64 - 2)).unwrap();
    let mut across = [0u8; 4];
    reader.read_exact(&mut across).unwrap();
    assert_eq!(across, content[BS - 2..BS + 2]);

    assert!(reader.seek(SeekFrom::Current(-(BS as i64) * 4)).is_err());

    reader.seek(SeekFrom::Start(content.len() as u64 + 10)).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(reader.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_corrupt_block_fails_only_that_read() {
    let mut bytes = Fixture::new()
        .file("bad.bin", pattern(5000))
        .file("good.bin", pattern(4000))
        .build();
    let offset = {
        let archive = open(bytes.clone());
        archive.get_entry("bad.bin").unwrap().toc().payload_offset as usize
    };
    bytes[offset] = 0x00;
    bytes[offset + 1] = 0x00;

    let archive = open(bytes);
    assert!(matches!(
        archive.read_file("bad.bin"),
        Err(Error::CorruptBlock { .. })
    ));
    assert_eq!(archive.read_file("good.bin").unwrap(), pattern(4000));

    let mut reader = archive.open_entry("bad.bin").unwrap();
    let err = reader.read(&mut [0u8; 16]).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn test_unsupported_compression_and_custom_codec() {
    let bytes = Fixture::new()
        .compression(b"oodl")
        .file("a.txt", pattern(2000))
        .build();
    assert!(matches!(
        open_err(bytes.clone()),
        Error::UnsupportedCompression(_)
    ));

    let mut options = OpenOptions::new();
    options.codec(
        CompressionType(u32::from_be_bytes(*b"oodl")),
        Arc::new(ZlibDecompressor),
    );
    let archive = PsarcArchive::from_source(bytes, &options).unwrap();
    assert_eq!(archive.read_file("a.txt").unwrap(), pattern(2000));
}

#[test]
fn test_verify_names() {
    let archive = open(
        Fixture::new()
            .file("a.txt", b"a".to_vec())
            .file("b.txt", b"b".to_vec())
            .build(),
    );
    assert!(archive.verify_names().is_empty());

    // Same line count, but the second path does not hash to the stored digest
    let renamed = open(
        Fixture::new()
            .file("a.txt", b"a".to_vec())
            .file("b.txt", b"b".to_vec())
            .manifest(b"a.txt\nrenamed.txt")
            .build(),
    );
    let mismatched: Vec<&str> = renamed.verify_names().iter().map(|e| e.name()).collect();
    assert_eq!(mismatched, vec!["renamed.txt"]);

    let ignore_case = open(
        Fixture::new()
            .flags(0x1)
            .file("Songs/Mixed.Case", b"x".to_vec())
            .build(),
    );
    assert!(ignore_case.header().archive_flags.ignore_case());
    assert!(ignore_case.verify_names().is_empty());
}

#[test]
fn test_concurrent_handles() {
    let files: Vec<(String, Vec<u8>)> = (0..8)
        .map(|i| (format!("dir/file{i}.bin"), pattern(BS + i * 1000)))
        .collect();
    let mut fixture = Fixture::new();
    for (name, data) in &files {
        fixture = fixture.file(name, data.clone());
    }
    let reader = Arc::new(PsarcReader::from_source(fixture.build(), &OpenOptions::default()).unwrap());

    let handles: Vec<_> = files
        .into_iter()
        .map(|(name, expected)| {
            let reader = reader.clone();
            thread::spawn(move || {
                for _ in 0..4 {
                    let mut data = Vec::new();
                    reader
                        .open_entry(&name)
                        .unwrap()
                        .read_to_end(&mut data)
                        .unwrap();
                    assert_eq!(data, expected);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_open_from_stream() {
    let bytes = Fixture::new().file("a.txt", pattern(BS + 1)).build();
    let reader = PsarcReader::from_stream(Cursor::new(bytes), &OpenOptions::default()).unwrap();
    assert_eq!(reader.read_file("a.txt").unwrap(), pattern(BS + 1));
}

#[test]
fn test_open_from_disk_and_extract() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("songs.psarc");
    let output_dir = temp_dir.path().join("output");

    fs::write(
        &archive_path,
        Fixture::new()
            .file("file1.txt", b"Hello, World!".to_vec())
            .file("subdir/file3.txt", pattern(BS * 2))
            .file("../escape.txt", b"kept inside".to_vec())
            .build(),
    )
    .unwrap();

    extract(&archive_path, &output_dir).unwrap();

    assert_eq!(
        fs::read(output_dir.join("file1.txt")).unwrap(),
        b"Hello, World!"
    );
    assert_eq!(
        fs::read(output_dir.join("subdir").join("file3.txt")).unwrap(),
        pattern(BS * 2)
    );
    assert_eq!(
        fs::read(output_dir.join("escape.txt")).unwrap(),
        b"kept inside"
    );
    assert!(!temp_dir.path().join("escape.txt").exists());

    let archive = PsarcArchive::open(&archive_path).unwrap();
    let single = temp_dir.path().join("single.txt");
    archive.extract_file("file1.txt", &single).unwrap();
    assert_eq!(fs::read(single).unwrap(), b"Hello, World!");
}

#[test]
fn test_missing_archive_is_source_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    assert!(matches!(
        PsarcArchive::open(temp_dir.path().join("missing.psarc")),
        Err(Error::SourceUnavailable { .. })
    ));
}

#[test]
fn test_extraction_can_be_aborted() {
    struct AbortAfterFirst {
        started: usize,
    }

    impl ArchiveHandler for AbortAfterFirst {
        fn on_entry_started(&mut self, _name: &str) -> ControlAction {
            self.started += 1;
            if self.started > 1 {
                ControlAction::Abort
            } else {
                ControlAction::Continue
            }
        }
    }

    let temp_dir = TempDir::new().unwrap();
    let archive = open(
        Fixture::new()
            .file("one", b"1".to_vec())
            .file("two", b"2".to_vec())
            .build(),
    );
    let mut handler = AbortAfterFirst { started: 0 };
    let result = archive.extract_all_with_progress(temp_dir.path(), &mut handler);

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(temp_dir.path().join("one").exists());
    assert!(!temp_dir.path().join("two").exists());
}

#[test]
fn test_progress_reports_bytes() {
    #[derive(Default)]
    struct Recorder {
        last: Option<ProgressInfo>,
        finished: bool,
    }

    impl ArchiveHandler for Recorder {
        fn on_progress(&mut self, progress: &ProgressInfo) -> ControlAction {
            self.last = Some(progress.clone());
            ControlAction::Continue
        }

        fn on_finished(&mut self) {
            self.finished = true;
        }
    }

    let temp_dir = TempDir::new().unwrap();
    let archive = open(
        Fixture::new()
            .file("one", pattern(BS + 5))
            .file("two", pattern(95))
            .build(),
    );
    let mut recorder = Recorder::default();
    archive
        .extract_all_with_progress(temp_dir.path(), &mut recorder)
        .unwrap();

    let last = recorder.last.unwrap();
    assert!(recorder.finished);
    assert_eq!(last.processed_bytes, (BS + 100) as u64);
    assert_eq!(last.total_bytes, Some((BS + 100) as u64));
    assert_eq!(last.processed_files, 2);
    assert_eq!(last.overall_progress(), 100.0);
}

#[test]
fn test_filesystem_view_is_read_only() {
    let fs = open(
        Fixture::new()
            .file("songs/a.ogg", b"a".to_vec())
            .file("songs/b.ogg", b"bb".to_vec())
            .build(),
    )
    .into_filesystem();

    assert!(fs.directory_exists("songs"));
    assert_eq!(fs.file_length("songs/b.ogg").unwrap(), 2);
    assert_eq!(fs.list_entries("songs").count(), 2);

    let err = fs.delete_file("songs/a.ogg").unwrap_err();
    assert!(matches!(err, Error::ReadOnlyViolation { .. }));
    assert!(err.to_string().contains("read-only"));
    assert!(matches!(
        fs.move_file("songs/a.ogg", "songs/c.ogg"),
        Err(Error::ReadOnlyViolation { .. })
    ));
    assert!(fs.file_exists("songs/a.ogg"));
    assert!(!fs.file_exists("songs/c.ogg"));
}
