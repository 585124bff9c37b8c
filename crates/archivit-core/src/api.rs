//! High-level public API for archive creation and extraction.

use std::path::Path;

use crate::ExtractionReport;
use crate::NoopProgress;
use crate::ProgressCallback;
use crate::Result;
use crate::creation::CreationConfig;
use crate::creation::CreationReport;
use crate::extraction::ExtractionConfig;

/// Packs the directory tree at `source` into a new archive at
/// `destination`.
///
/// Regular files become entries; directories are implied by entry paths;
/// symbolic links are skipped with a warning. The archive is written in
/// the current format. On failure nothing is left at `destination`.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is invalid
/// - `source` is missing or not a directory
/// - `destination` already exists
/// - A file cannot be read or the archive cannot be written
///
/// # Examples
///
/// ```no_run
/// use archivit_core::create_archive;
/// use archivit_core::creation::CreationConfig;
/// use archivit_core::crypto::Password;
///
/// let config = CreationConfig::default().with_password(Some(Password::new("secret1")?));
/// let report = create_archive("photos/", "photos.archivit", &config)?;
/// println!("Archived {} files", report.files_added);
/// # Ok::<(), archivit_core::ArchiveError>(())
/// ```
pub fn create_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
    config: &CreationConfig,
) -> Result<CreationReport> {
    create_archive_with_progress(source, destination, config, &mut NoopProgress)
}

/// Same as [`create_archive`], reporting progress to `progress`.
///
/// # Errors
///
/// See [`create_archive`].
pub fn create_archive_with_progress<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
    config: &CreationConfig,
    progress: &mut dyn ProgressCallback,
) -> Result<CreationReport> {
    crate::creation::creator::create_with_progress(
        source.as_ref(),
        destination.as_ref(),
        config,
        progress,
    )
}

/// Extracts every entry of `archive` below `destination`.
///
/// The destination is created if missing. Entries are restored with their
/// permission bits and modification time. Extraction is not atomic: when an
/// entry fails, earlier entries stay on disk.
///
/// # Errors
///
/// Returns an error if:
/// - The archive is not an archivit container or is malformed
/// - A password is required but missing, or does not match
/// - An entry path escapes the destination
/// - An entry fails its integrity check
/// - I/O operations fail
///
/// # Examples
///
/// ```no_run
/// use archivit_core::extract_archive;
/// use archivit_core::extraction::ExtractionConfig;
///
/// let report = extract_archive("photos.archivit", "restored/", &ExtractionConfig::default())?;
/// println!("Extracted {} files", report.files_extracted);
/// # Ok::<(), archivit_core::ArchiveError>(())
/// ```
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    archive: P,
    destination: Q,
    config: &ExtractionConfig,
) -> Result<ExtractionReport> {
    extract_archive_with_progress(archive, destination, config, &mut NoopProgress)
}

/// Same as [`extract_archive`], reporting progress to `progress`.
///
/// # Errors
///
/// See [`extract_archive`].
pub fn extract_archive_with_progress<P: AsRef<Path>, Q: AsRef<Path>>(
    archive: P,
    destination: Q,
    config: &ExtractionConfig,
    progress: &mut dyn ProgressCallback,
) -> Result<ExtractionReport> {
    crate::extraction::extract::extract_with_progress(
        archive.as_ref(),
        destination.as_ref(),
        config,
        progress,
    )
}
