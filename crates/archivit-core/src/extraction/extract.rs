//! Unpacking a container into a directory.

use std::fs;
use std::fs::OpenOptions;
use std::io::BufRead;
use std::io::BufWriter;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;

use tracing::debug;
use tracing::info;

use crate::ArchiveError;
use crate::ExtractionReport;
use crate::ProgressCallback;
use crate::Result;
use crate::extraction::config::ExtractionConfig;
use crate::extraction::reader::ArchiveReader;
use crate::extraction::reader::EntryHeader;
use crate::io::PartialFileGuard;
use crate::report::ProgressTracker;
use crate::types::DestDir;
use crate::types::SafePath;

const WRITE_BUFFER: usize = 64 * 1024;

/// Extracts every entry of `archive` below `destination`.
///
/// The header is parsed and the password checked for presence before the
/// destination is touched. Entries are written in archive order. An error
/// stops extraction; entries already written stay in place and the entry
/// being written is removed.
pub(crate) fn extract_with_progress(
    archive: &Path,
    destination: &Path,
    config: &ExtractionConfig,
    progress: &mut dyn ProgressCallback,
) -> Result<ExtractionReport> {
    let start = Instant::now();
    let mut report = ExtractionReport::new();

    let mut reader = ArchiveReader::open(archive)?;
    reader.unlock(config.password.as_ref())?;
    if config.password.is_some() && !reader.is_protected() {
        report.add_warning("archive is not password protected; password ignored");
    }
    let separator = reader.header().separator_char();

    let dest = open_destination(archive, destination, config, &mut report)?;
    let mut tracker = ProgressTracker::new(progress, 0);

    while let Some(entry) = reader.next_entry()? {
        if let Some(max) = config.max_entry_size
            && entry.metadata.size > max
        {
            return Err(ArchiveError::SecurityViolation {
                reason: format!(
                    "entry {} declares {} bytes, limit is {max}",
                    entry.metadata.path, entry.metadata.size
                ),
            });
        }

        let safe = SafePath::from_stored(&entry.metadata.path, separator, &dest)?;
        let target = dest.join(&safe);
        tracker.on_entry_start(safe.as_path());

        if let Some(parent) = target.parent() {
            report.directories_created += create_parents(parent)?;
        }
        if !clear_target(&target, config.overwrite)? {
            reader.skip_payload(&entry)?;
            report.add_warning(format!(
                "skipped existing file: {}",
                safe.as_path().display()
            ));
            tracker.on_entry_complete(safe.as_path());
            continue;
        }

        let verify = config.verify_integrity && entry.integrity.is_some();
        let written = write_entry(&mut reader, &entry, &target, verify)?;
        entry.metadata.apply_to(&target)?;

        report.files_extracted += 1;
        report.bytes_written += written;
        if verify {
            report.files_verified += 1;
        }
        tracker.on_bytes_written(written);
        tracker.on_entry_complete(safe.as_path());
        debug!(path = %entry.metadata.path, bytes = written, "entry extracted");
    }

    report.duration = start.elapsed();
    tracker.on_complete();

    info!(
        archive = %archive.display(),
        destination = %dest.as_path().display(),
        files = report.files_extracted,
        bytes = report.bytes_written,
        "archive extracted"
    );
    Ok(report)
}

fn open_destination(
    archive: &Path,
    destination: &Path,
    config: &ExtractionConfig,
    report: &mut ExtractionReport,
) -> Result<DestDir> {
    let existed = destination.exists();
    let mut dest = DestDir::new(destination)?;
    if !existed {
        report.directories_created += 1;
    }

    if config.archive_subdirectory {
        let stem = archive
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| ArchiveError::InvalidPath {
                path: archive.to_path_buf(),
                reason: "archive name cannot name a directory".to_string(),
            })?;
        let existed = dest.as_path().join(stem).exists();
        dest = dest.subdirectory(stem)?;
        if !existed {
            report.directories_created += 1;
        }
    }
    Ok(dest)
}

/// Creates `dir` and its missing ancestors, returning how many were made.
fn create_parents(dir: &Path) -> Result<usize> {
    let missing = dir.ancestors().take_while(|d| !d.exists()).count();
    if missing > 0 {
        fs::create_dir_all(dir)?;
    }
    Ok(missing)
}

/// Makes room for a new file at `target`.
///
/// Returns `false` if an existing file must be kept.
fn clear_target(target: &Path, overwrite: bool) -> Result<bool> {
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => Err(ArchiveError::InvalidPath {
            path: target.to_path_buf(),
            reason: "a directory exists at the entry path".to_string(),
        }),
        Ok(_) if !overwrite => Ok(false),
        Ok(_) => {
            fs::remove_file(target)?;
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e.into()),
    }
}

/// Writes one payload to a new file at `target` and checks it.
///
/// The file is removed if anything fails.
fn write_entry<R: BufRead>(
    reader: &mut ArchiveReader<R>,
    entry: &EntryHeader,
    target: &Path,
    verify: bool,
) -> Result<u64> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)?;
    let guard = PartialFileGuard::new(target.to_path_buf());

    let decoded = reader.decode_payload(
        entry,
        BufWriter::with_capacity(WRITE_BUFFER, file),
        verify,
    )?;
    let file = decoded
        .sink
        .into_inner()
        .map_err(|e| ArchiveError::Io(e.into_error()))?;
    drop(file);
    entry.check_decoded(decoded.written, decoded.digest.as_ref())?;

    debug!(path = %guard.path().display(), "file written");
    guard.disarm();
    Ok(decoded.written)
}
