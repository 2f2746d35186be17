//! End-to-end tests for nested zip extraction

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uar_lib::{
    extract_nested, inspect, progress, ErrorKind, ExtractOptions, ExtractionWorker, GroupKey,
    Pattern, ProgressEvent,
};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Build a zip archive in memory from (name, contents) pairs. Names with
/// a trailing slash become directory entries.
fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        if name.ends_with('/') {
            writer.add_directory(name.to_string(), options).unwrap();
        } else {
            writer.start_file(name.to_string(), options).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

fn gzip_bytes(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Write the reference outer archive from the spec scenario: two inner
/// archives plus a loose text file.
fn write_outer_archive(dir: &Path) -> PathBuf {
    let inner1 = zip_bytes(&[
        ("img_001_warped.png", b"warped-1".as_slice()),
        ("img_001_raw.png", b"raw-1".as_slice()),
    ]);
    let inner2 = zip_bytes(&[("img_002_warped.png", b"warped-2".as_slice())]);
    let outer = zip_bytes(&[
        ("1.zip", inner1.as_slice()),
        ("2.zip", inner2.as_slice()),
        ("notes.txt", b"not an archive".as_slice()),
    ]);

    let path = dir.join("a.zip");
    fs::write(&path, outer).unwrap();
    path
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_inner_archives_are_listed_in_stored_order() {
    let temp = TempDir::new().unwrap();
    let outer = zip_bytes(&[
        ("b.zip", b"".as_slice()),
        ("readme.md", b"hi".as_slice()),
        ("A.ZIP", b"".as_slice()),
        ("sub/c.zip", b"".as_slice()),
    ]);
    let path = temp.path().join("outer.zip");
    fs::write(&path, outer).unwrap();

    let names = inspect::inner_archives(&path).unwrap();
    assert_eq!(names, vec!["b.zip", "A.ZIP", "sub/c.zip"]);
}

#[test]
fn test_inspect_missing_archive() {
    let temp = TempDir::new().unwrap();
    let err = inspect::inner_archives(&temp.path().join("absent.zip")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArchiveOpen);
}

#[test]
fn test_inspect_invalid_archive() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.zip");
    fs::write(&path, b"this is not a zip container").unwrap();

    let err = inspect::inner_archives(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArchiveCorrupt);
}

#[test]
fn test_extraction_filters_by_pattern() {
    let temp = TempDir::new().unwrap();
    let archive = write_outer_archive(temp.path());
    let pattern = Pattern::new(r"_warped\.").unwrap();

    let written = extract_nested(&archive, &pattern, &ExtractOptions::default()).unwrap();
    assert_eq!(written, 2);

    let out_dir = temp.path().join("a");
    assert_eq!(
        sorted_names(&out_dir),
        vec!["img_001_warped.png", "img_002_warped.png"]
    );
    assert_eq!(fs::read(out_dir.join("img_001_warped.png")).unwrap(), b"warped-1");
    assert_eq!(fs::read(out_dir.join("img_002_warped.png")).unwrap(), b"warped-2");
}

#[test]
fn test_directory_entries_are_skipped() {
    let temp = TempDir::new().unwrap();
    let inner = zip_bytes(&[
        ("results_warped/", b"".as_slice()),
        ("results_warped/img_001_warped.png", b"nested".as_slice()),
    ]);
    let outer = zip_bytes(&[("1.zip", inner.as_slice())]);
    let archive = temp.path().join("run.zip");
    fs::write(&archive, outer).unwrap();

    let pattern = Pattern::new("_warped").unwrap();
    let written = extract_nested(&archive, &pattern, &ExtractOptions::default()).unwrap();

    // The directory entry is skipped, the nested file lands flat
    assert_eq!(written, 1);
    let out_dir = temp.path().join("run");
    assert_eq!(sorted_names(&out_dir), vec!["img_001_warped.png"]);
}

#[test]
fn test_stale_output_dir_is_destroyed() {
    let temp = TempDir::new().unwrap();
    let archive = write_outer_archive(temp.path());

    let out_dir = temp.path().join("a");
    fs::create_dir(&out_dir).unwrap();
    fs::write(out_dir.join("stale.txt"), b"from an earlier run").unwrap();

    let pattern = Pattern::new(r"_warped\.").unwrap();
    extract_nested(&archive, &pattern, &ExtractOptions::default()).unwrap();

    assert_eq!(
        sorted_names(&out_dir),
        vec!["img_001_warped.png", "img_002_warped.png"]
    );
}

#[test]
fn test_decompression_pass() {
    let temp = TempDir::new().unwrap();
    let payload = b"plain alignment data";
    let inner = zip_bytes(&[("data_001_warped.txt.gz", gzip_bytes(payload).as_slice())]);
    let outer = zip_bytes(&[("1.zip", inner.as_slice())]);
    let archive = temp.path().join("run.zip");
    fs::write(&archive, outer).unwrap();

    let pattern = Pattern::new("_warped").unwrap();
    let options = ExtractOptions {
        decompress_gzip: true,
        ..Default::default()
    };
    extract_nested(&archive, &pattern, &options).unwrap();

    let out_dir = temp.path().join("run");
    assert_eq!(sorted_names(&out_dir), vec!["data_001_warped.txt"]);
    assert_eq!(fs::read(out_dir.join("data_001_warped.txt")).unwrap(), payload);
}

#[test]
fn test_decompression_requires_gz_suffix() {
    let temp = TempDir::new().unwrap();
    let inner = zip_bytes(&[("img_001_warped.png", b"not gzipped".as_slice())]);
    let outer = zip_bytes(&[("1.zip", inner.as_slice())]);
    let archive = temp.path().join("run.zip");
    fs::write(&archive, outer).unwrap();

    let pattern = Pattern::new("_warped").unwrap();
    let options = ExtractOptions {
        decompress_gzip: true,
        ..Default::default()
    };
    let err = extract_nested(&archive, &pattern, &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decompression);

    // Extraction already completed; the file stays on disk
    assert!(temp.path().join("run").join("img_001_warped.png").exists());
}

#[test]
fn test_reorganization_pass() {
    let temp = TempDir::new().unwrap();
    let archive = write_outer_archive(temp.path());

    let pattern = Pattern::new(r"_warped\.").unwrap();
    let options = ExtractOptions {
        reorganize_into_folders: true,
        group_key: GroupKey::NumericToken,
        ..Default::default()
    };
    extract_nested(&archive, &pattern, &options).unwrap();

    let out_dir = temp.path().join("a");
    assert_eq!(sorted_names(&out_dir), vec!["001", "002"]);
    assert!(out_dir.join("001").join("img_001_warped.png").exists());
    assert!(out_dir.join("002").join("img_002_warped.png").exists());
}

#[test]
fn test_reorganization_groups_files_with_same_key() {
    let temp = TempDir::new().unwrap();
    let inner = zip_bytes(&[
        ("img_001_warped.png", b"a".as_slice()),
        ("map_001_warped.txt", b"b".as_slice()),
    ]);
    let outer = zip_bytes(&[("1.zip", inner.as_slice())]);
    let archive = temp.path().join("run.zip");
    fs::write(&archive, outer).unwrap();

    let pattern = Pattern::new("_warped").unwrap();
    let options = ExtractOptions {
        reorganize_into_folders: true,
        ..Default::default()
    };
    extract_nested(&archive, &pattern, &options).unwrap();

    let group = temp.path().join("run").join("001");
    assert_eq!(sorted_names(&group), vec!["img_001_warped.png", "map_001_warped.txt"]);
}

#[test]
fn test_reorganization_fails_without_group_key() {
    let temp = TempDir::new().unwrap();
    let inner = zip_bytes(&[("warped.png", b"no token".as_slice())]);
    let outer = zip_bytes(&[("1.zip", inner.as_slice())]);
    let archive = temp.path().join("run.zip");
    fs::write(&archive, outer).unwrap();

    let pattern = Pattern::new("warped").unwrap();
    let options = ExtractOptions {
        reorganize_into_folders: true,
        group_key: GroupKey::NumericToken,
        ..Default::default()
    };
    let err = extract_nested(&archive, &pattern, &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reorganization);
}

#[test]
fn test_worker_emits_events_in_order() {
    let temp = TempDir::new().unwrap();
    let archive = write_outer_archive(temp.path());

    let (tx, rx) = progress::channel();
    let mut worker = ExtractionWorker::new(tx);
    worker
        .start(
            archive,
            Pattern::new(r"_warped\.").unwrap(),
            ExtractOptions::default(),
        )
        .unwrap();

    // iter() ends once the worker thread drops its sender
    let events: Vec<ProgressEvent> = rx.iter().collect();
    worker.join();

    assert_eq!(
        events,
        vec![
            ProgressEvent::Started,
            ProgressEvent::TotalUnits(2),
            ProgressEvent::UnitCompleted,
            ProgressEvent::UnitCompleted,
            ProgressEvent::Finished,
        ]
    );
}

#[test]
fn test_worker_reports_failure_as_final_event() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("absent.zip");

    let (tx, rx) = progress::channel();
    let mut worker = ExtractionWorker::new(tx);
    worker
        .start(missing, Pattern::new("x").unwrap(), ExtractOptions::default())
        .unwrap();

    let events: Vec<ProgressEvent> = rx.iter().collect();
    worker.join();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], ProgressEvent::Started);
    match &events[1] {
        ProgressEvent::Failed { kind, context } => {
            assert_eq!(*kind, ErrorKind::ArchiveOpen);
            assert!(context.contains("absent.zip"));
        }
        other => panic!("expected a Failed event, got {:?}", other),
    }
}

#[test]
fn test_worker_failure_leaves_no_output_dir() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.zip");
    fs::write(&path, b"garbage").unwrap();

    let pattern = Pattern::new("x").unwrap();
    let err = extract_nested(&path, &pattern, &ExtractOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArchiveCorrupt);

    // Fail fast: inspection failed before the output dir was created
    assert!(!temp.path().join("broken").exists());
}

#[test]
fn test_worker_is_single_shot() {
    let temp = TempDir::new().unwrap();
    let archive = write_outer_archive(temp.path());
    let pattern = Pattern::new(r"_warped\.").unwrap();

    let (tx, rx) = progress::channel();
    let mut worker = ExtractionWorker::new(tx);
    worker
        .start(archive.clone(), pattern.clone(), ExtractOptions::default())
        .unwrap();

    let err = worker
        .start(archive, pattern, ExtractOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyRunning);

    let _ = rx.iter().count();
    worker.join();
}

#[test]
fn test_basename_collision_last_writer_wins() {
    let temp = TempDir::new().unwrap();
    let inner1 = zip_bytes(&[("img_001_warped.png", b"first".as_slice())]);
    let inner2 = zip_bytes(&[("img_001_warped.png", b"second".as_slice())]);
    let outer = zip_bytes(&[("1.zip", inner1.as_slice()), ("2.zip", inner2.as_slice())]);
    let archive = temp.path().join("run.zip");
    fs::write(&archive, outer).unwrap();

    let pattern = Pattern::new("_warped").unwrap();
    extract_nested(&archive, &pattern, &ExtractOptions::default()).unwrap();

    let out_dir = temp.path().join("run");
    assert_eq!(sorted_names(&out_dir), vec!["img_001_warped.png"]);
    assert_eq!(fs::read(out_dir.join("img_001_warped.png")).unwrap(), b"second");
}
