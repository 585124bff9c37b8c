//! Integration tests for archivit-core.
//!
//! These tests verify end-to-end workflows with real filesystem operations.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use archivit_core::ArchiveError;
use archivit_core::create_archive;
use archivit_core::creation::CreationConfig;
use archivit_core::creation::writer::ArchiveWriter;
use archivit_core::crypto::Password;
use archivit_core::crypto::TAG_LEN;
use archivit_core::extract_archive;
use archivit_core::extraction::ArchiveReader;
use archivit_core::extraction::ExtractionConfig;
use archivit_core::format::EntryMetadata;
use archivit_core::integrity;
use archivit_core::integrity::IntegrityMetadata;
use archivit_core::list_archive;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::SystemTime;
use tempfile::TempDir;
use walkdir::WalkDir;

fn build_tree(root: &Path) -> PathBuf {
    let source = root.join("tree");
    fs::create_dir_all(source.join("nested").join("deeper")).unwrap();
    fs::write(source.join("hello.txt"), "hello world").unwrap();
    fs::write(source.join("empty.dat"), b"").unwrap();
    fs::write(source.join("nested").join("repeat.txt"), "a".repeat(10_000)).unwrap();
    let noise: Vec<u8> = (0..200_000u32)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8)
        .collect();
    fs::write(source.join("nested").join("deeper").join("noise.bin"), noise).unwrap();

    let stamp = SystemTime::UNIX_EPOCH + Duration::from_millis(1_600_000_000_250);
    fs::File::options()
        .write(true)
        .open(source.join("hello.txt"))
        .unwrap()
        .set_modified(stamp)
        .unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let script = source.join("nested").join("run.sh");
        fs::write(&script, "#!/bin/sh\necho hi\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    }

    source
}

/// Relative path to contents of every regular file below `root`.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(Result::unwrap)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

fn config(password: Option<&str>, compression: bool, integrity: bool) -> CreationConfig {
    CreationConfig::default()
        .with_password(password.map(|p| Password::new(p).unwrap()))
        .with_compression(compression)
        .with_integrity(integrity)
        .with_chunk_size(16 * 1024)
}

fn extraction(password: Option<&str>) -> ExtractionConfig {
    ExtractionConfig::default().with_password(password.map(|p| Password::new(p).unwrap()))
}

#[test]
fn test_round_trip_every_flag_combination() {
    for password in [None, Some("secret1")] {
        for compression in [false, true] {
            for integrity in [false, true] {
                let temp = TempDir::new().unwrap();
                let source = build_tree(temp.path());
                let archive = temp.path().join("tree.archivit");
                let dest = temp.path().join("out");

                let created =
                    create_archive(&source, &archive, &config(password, compression, integrity))
                        .unwrap();
                let report = extract_archive(&archive, &dest, &extraction(password)).unwrap();

                assert_eq!(report.files_extracted, created.files_added);
                assert_eq!(
                    snapshot(&source),
                    snapshot(&dest),
                    "password={password:?} compression={compression} integrity={integrity}"
                );

                let modified = fs::metadata(dest.join("hello.txt"))
                    .unwrap()
                    .modified()
                    .unwrap();
                assert_eq!(
                    modified,
                    SystemTime::UNIX_EPOCH + Duration::from_millis(1_600_000_000_250)
                );

                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let mode = fs::metadata(dest.join("nested").join("run.sh"))
                        .unwrap()
                        .permissions()
                        .mode();
                    assert_eq!(mode & 0o700, 0o700);
                }
            }
        }
    }
}

#[test]
fn test_password_gate() {
    let temp = TempDir::new().unwrap();
    let source = build_tree(temp.path());
    let archive = temp.path().join("locked.archivit");
    create_archive(&source, &archive, &config(Some("secret1"), true, true)).unwrap();

    let wrong = extract_archive(&archive, temp.path().join("a"), &extraction(Some("wrong1")));
    assert!(matches!(wrong, Err(ArchiveError::PasswordMismatch)));

    let missing = extract_archive(&archive, temp.path().join("b"), &extraction(None));
    assert!(matches!(missing, Err(ArchiveError::PasswordRequired)));
    assert!(!temp.path().join("b").exists());

    extract_archive(&archive, temp.path().join("c"), &extraction(Some("secret1"))).unwrap();
    assert_eq!(snapshot(&source), snapshot(&temp.path().join("c")));
}

#[test]
fn test_repeated_bytes_are_compressed() {
    let content = vec![b'z'; 10_000];
    assert!(integrity::should_compress(&content));

    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("z.txt"), &content).unwrap();
    let archive = temp.path().join("z.archivit");
    create_archive(&source, &archive, &CreationConfig::default()).unwrap();

    let manifest = list_archive(&archive).unwrap();
    let entry = &manifest.entries[0];
    assert!(entry.compressed);
    assert_eq!(entry.size, 10_000);
    assert!(entry.stored_size < entry.size);

    extract_archive(&archive, temp.path().join("out"), &ExtractionConfig::default()).unwrap();
    assert_eq!(fs::read(temp.path().join("out").join("z.txt")).unwrap(), content);
}

#[test]
fn test_integrity_record_detects_single_flip() {
    let stored = b"stored payload bytes".to_vec();
    let record = IntegrityMetadata::compute(&stored, stored.len() as u64, false).unwrap();
    assert!(record.verify(&stored));

    for i in 0..stored.len() {
        let mut flipped = stored.clone();
        flipped[i] ^= 0x20;
        assert!(!record.verify(&flipped), "flip at {i} went unnoticed");
    }
}

#[test]
fn test_corrupted_byte_fails_integrity() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("data.bin"), vec![7u8; 3000]).unwrap();
    let archive = temp.path().join("plain.archivit");
    create_archive(&source, &archive, &config(None, false, true)).unwrap();

    let mut bytes = fs::read(&archive).unwrap();
    let middle = bytes.len() - 1500;
    bytes[middle] ^= 0x01;
    fs::write(&archive, bytes).unwrap();

    let dest = temp.path().join("out");
    let result = extract_archive(&archive, &dest, &ExtractionConfig::default());
    assert!(matches!(result, Err(ArchiveError::IntegrityMismatch { .. })));
    assert!(!dest.join("data.bin").exists());
}

#[test]
fn test_exact_multiple_of_chunk_size() {
    let chunk = 1024;
    let content = vec![0x5a_u8; chunk * 4];
    let config = CreationConfig::default()
        .with_password(Some(Password::new("secret1").unwrap()))
        .with_compression(false)
        .with_integrity(false)
        .with_chunk_size(chunk);

    let entry = EntryMetadata {
        name: "four.bin".to_string(),
        path: "four.bin".to_string(),
        readable: true,
        executable: false,
        writable: true,
        modified_millis: 0,
        size: 0,
    };
    let mut sized = entry.clone();
    sized.size = content.len() as u64;
    let meta_frame = 8 + sized.encoded_len();

    let mut writer = ArchiveWriter::new(Vec::new(), &config).unwrap();
    writer.add_entry(entry, &content).unwrap();
    let bytes = writer.finish().unwrap();

    // header, metadata frame, compressed flag, then four framed chunks each
    // followed by its continuation flag
    let header = 10 + 1 + 1 + 1 + 12;
    let frame = 8 + chunk + TAG_LEN + 1;
    assert_eq!(bytes.len(), header + meta_frame + 1 + 4 * frame);
    assert_eq!(bytes[bytes.len() - 1], 0);
    assert_eq!(bytes[bytes.len() - 1 - frame], 1);

    let mut reader = ArchiveReader::new(bytes.as_slice()).unwrap();
    reader
        .unlock(Some(&Password::new("secret1").unwrap()))
        .unwrap();
    let header = reader.next_entry().unwrap().unwrap();
    let decoded = reader.decode_payload(&header, Vec::new(), false).unwrap();
    assert_eq!(decoded.sink, content);
    assert!(reader.next_entry().unwrap().is_none());
}

#[test]
fn test_traversal_entry_rejected() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("evil.archivit");

    let mut writer = ArchiveWriter::new(Vec::new(), &CreationConfig::default()).unwrap();
    let sep = writer.header().separator_char();
    writer
        .add_entry(
            EntryMetadata {
                name: "first.txt".to_string(),
                path: "first.txt".to_string(),
                readable: true,
                executable: false,
                writable: true,
                modified_millis: 0,
                size: 0,
            },
            b"fine",
        )
        .unwrap();
    writer
        .add_entry(
            EntryMetadata {
                name: "passwd".to_string(),
                path: format!("..{sep}..{sep}etc{sep}passwd"),
                readable: true,
                executable: false,
                writable: true,
                modified_millis: 0,
                size: 0,
            },
            b"root::0:0",
        )
        .unwrap();
    fs::write(&archive, writer.finish().unwrap()).unwrap();

    let dest = temp.path().join("jail").join("inner");
    let result = extract_archive(&archive, &dest, &ExtractionConfig::default());
    assert!(matches!(result, Err(ArchiveError::PathTraversal { .. })));

    assert!(dest.join("first.txt").exists());
    assert!(!temp.path().join("etc").exists());
    assert!(!temp.path().join("jail").join("etc").exists());
}

#[test]
fn test_list_protected_archive_without_password() {
    let temp = TempDir::new().unwrap();
    let source = build_tree(temp.path());
    let archive = temp.path().join("locked.archivit");
    create_archive(&source, &archive, &config(Some("secret1"), true, true)).unwrap();

    let manifest = list_archive(&archive).unwrap();
    assert!(manifest.is_protected());
    let paths: Vec<PathBuf> = manifest
        .entries
        .iter()
        .map(|e| e.host_path(manifest.separator))
        .collect();
    assert!(paths.contains(&PathBuf::from("hello.txt")));
    assert!(paths.contains(&Path::new("nested").join("repeat.txt")));

    let hello = manifest
        .entries
        .iter()
        .find(|e| e.name == "hello.txt")
        .unwrap();
    assert_eq!(hello.size, 11);
}

#[test]
fn test_ciphertext_tamper_fails_authentication() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("two.bin"), vec![3u8; 2048]).unwrap();
    let archive = temp.path().join("two.archivit");
    let config = config(Some("secret1"), false, false).with_chunk_size(1024);
    create_archive(&source, &archive, &config).unwrap();

    let original = fs::read(&archive).unwrap();
    let body = 1024 + TAG_LEN;
    let second = original.len() - 1 - body;
    let first = second - 1 - 8 - body;

    let mut tampered = original.clone();
    tampered[first + 10] ^= 0x80;
    fs::write(&archive, &tampered).unwrap();
    let result = extract_archive(&archive, temp.path().join("a"), &extraction(Some("secret1")));
    assert!(matches!(result, Err(ArchiveError::PasswordMismatch)));

    // Same length chunks swapped in place: framing stays valid, nonces do not.
    let mut swapped = original.clone();
    swapped[first..first + body].copy_from_slice(&original[second..second + body]);
    swapped[second..second + body].copy_from_slice(&original[first..first + body]);
    fs::write(&archive, &swapped).unwrap();
    let result = extract_archive(&archive, temp.path().join("b"), &extraction(Some("secret1")));
    assert!(matches!(result, Err(ArchiveError::PasswordMismatch)));

    fs::write(&archive, &original).unwrap();
    extract_archive(&archive, temp.path().join("c"), &extraction(Some("secret1"))).unwrap();
    assert_eq!(
        fs::read(temp.path().join("c").join("two.bin")).unwrap(),
        vec![3u8; 2048]
    );
}

#[test]
fn test_create_into_existing_destination() {
    let temp = TempDir::new().unwrap();
    let source = build_tree(temp.path());
    let archive = temp.path().join("taken.archivit");
    fs::write(&archive, "precious").unwrap();

    let result = create_archive(&source, &archive, &CreationConfig::default());
    assert!(matches!(result, Err(ArchiveError::DestinationExists { .. })));
    assert_eq!(fs::read_to_string(&archive).unwrap(), "precious");
}

#[test]
fn test_missing_source_rejected() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("none.archivit");

    let result = create_archive(temp.path().join("nope"), &archive, &CreationConfig::default());
    assert!(matches!(result, Err(ArchiveError::SourceNotFound { .. })));

    let file = temp.path().join("file.txt");
    fs::write(&file, "x").unwrap();
    let result = create_archive(&file, &archive, &CreationConfig::default());
    assert!(matches!(result, Err(ArchiveError::SourceNotDirectory { .. })));
    assert!(!archive.exists());
}

#[cfg(target_os = "linux")]
#[test]
fn test_failed_create_leaves_no_file() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("a.txt"), "first").unwrap();
    fs::write(source.join(OsStr::from_bytes(b"bad\xff.txt")), "second").unwrap();

    let archive = temp.path().join("broken.archivit");
    let result = create_archive(&source, &archive, &CreationConfig::default());
    assert!(matches!(result, Err(ArchiveError::InvalidPath { .. })));
    assert!(!archive.exists());
}

#[test]
fn test_append_extension() {
    let temp = TempDir::new().unwrap();
    let source = build_tree(temp.path());
    let config = CreationConfig::default().with_append_extension(true);

    let report = create_archive(&source, temp.path().join("backup"), &config).unwrap();
    assert_eq!(report.archive_path, temp.path().join("backup.archivit"));
    assert!(report.archive_path.exists());
}

#[test]
fn test_symlinks_are_skipped_with_warning() {
    let temp = TempDir::new().unwrap();
    let source = build_tree(temp.path());
    #[cfg(unix)]
    std::os::unix::fs::symlink(source.join("hello.txt"), source.join("link.txt")).unwrap();
    let archive = temp.path().join("links.archivit");

    let report = create_archive(&source, &archive, &CreationConfig::default()).unwrap();
    if cfg!(unix) {
        assert_eq!(report.symlinks_skipped, 1);
        assert!(report.warnings.iter().any(|w| w.contains("link.txt")));
    }
    let manifest = list_archive(&archive).unwrap();
    assert!(manifest.entries.iter().all(|e| e.name != "link.txt"));
}
