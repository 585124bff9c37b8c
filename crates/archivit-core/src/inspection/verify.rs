//! Archive verification implementation.

use std::path::Path;
use std::time::Instant;

use tracing::debug;
use tracing::info;

use crate::ArchiveError;
use crate::Result;
use crate::crypto::Password;
use crate::extraction::ArchiveReader;
use crate::inspection::report::IssueKind;
use crate::inspection::report::VerificationReport;
use crate::types::SafePath;

/// Decodes every entry without writing anything and checks it.
///
/// Each payload is decrypted and inflated into a sink. Integrity records,
/// declared sizes and stored paths are checked; failures of those checks
/// are collected as issues so one bad entry does not hide the others.
///
/// # Errors
///
/// Fatal conditions still return an error, because the rest of the stream
/// cannot be trusted after them:
/// - [`ArchiveError::PasswordRequired`] / [`ArchiveError::PasswordMismatch`]
/// - [`ArchiveError::InvalidArchive`] for broken framing or undecodable data
/// - I/O errors
///
/// # Examples
///
/// ```no_run
/// use archivit_core::verify_archive;
///
/// let report = verify_archive("photos.archivit", None)?;
/// if report.is_ok() {
///     println!("{} entries verified", report.entries_verified);
/// } else {
///     for issue in &report.issues {
///         eprintln!("[{}] {}: {}", issue.kind, issue.path, issue.message);
///     }
/// }
/// # Ok::<(), archivit_core::ArchiveError>(())
/// ```
pub fn verify_archive<P: AsRef<Path>>(
    archive_path: P,
    password: Option<&Password>,
) -> Result<VerificationReport> {
    let start = Instant::now();
    let archive_path = archive_path.as_ref();
    let mut reader = ArchiveReader::open(archive_path)?;
    reader.unlock(password)?;
    let separator = reader.header().separator_char();

    let mut report = VerificationReport::new();
    while let Some(entry) = reader.next_entry()? {
        let path = entry.metadata.path.clone();
        report.total_entries += 1;
        report.total_size += entry.metadata.size;

        if let Err(e) = SafePath::normalize_stored(&path, separator) {
            report.add_issue(&path, IssueKind::UnsafePath, e.to_string());
        }

        let checked = entry.integrity.is_some();
        let decoded = reader.decode_payload(&entry, std::io::sink(), checked)?;
        match entry.check_decoded(decoded.written, decoded.digest.as_ref()) {
            Ok(()) if checked => report.entries_verified += 1,
            Ok(()) => report.entries_unchecked += 1,
            Err(e @ ArchiveError::IntegrityMismatch { .. }) => {
                report.add_issue(&path, IssueKind::IntegrityMismatch, e.to_string());
            }
            Err(ArchiveError::InvalidArchive(message)) => {
                report.add_issue(&path, IssueKind::SizeMismatch, message);
            }
            Err(e) => return Err(e),
        }
        debug!(path = %path, bytes = decoded.written, "entry verified");
    }

    report.finish(start.elapsed());
    info!(
        archive = %archive_path.display(),
        entries = report.total_entries,
        issues = report.issues.len(),
        status = %report.status,
        "archive verified"
    );
    Ok(report)
}
