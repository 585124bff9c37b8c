//! Archive listing implementation.

use std::path::Path;

use tracing::debug;

use crate::Result;
use crate::extraction::ArchiveReader;
use crate::inspection::manifest::ArchiveEntry;
use crate::inspection::manifest::ArchiveManifest;

/// Lists archive contents without extracting.
///
/// Payloads are skipped, never decrypted, so protected archives list
/// without a password.
///
/// # Errors
///
/// Returns error if:
/// - Archive file cannot be opened
/// - The header or an entry record is malformed
/// - The archive is truncated
///
/// # Examples
///
/// ```no_run
/// use archivit_core::list_archive;
///
/// let manifest = list_archive("photos.archivit")?;
/// println!("Archive contains {} files", manifest.total_entries);
/// for entry in &manifest.entries {
///     println!("{}: {} bytes", entry.path, entry.size);
/// }
/// # Ok::<(), archivit_core::ArchiveError>(())
/// ```
pub fn list_archive<P: AsRef<Path>>(archive_path: P) -> Result<ArchiveManifest> {
    let archive_path = archive_path.as_ref();
    let archive_size = std::fs::metadata(archive_path)?.len();
    let mut reader = ArchiveReader::open(archive_path)?;
    let mut manifest = ArchiveManifest::new(reader.header(), archive_size);

    while let Some(entry) = reader.next_entry()? {
        let stored_size = reader.skip_payload(&entry)?;
        manifest.add_entry(ArchiveEntry::from_header(entry, stored_size));
    }

    debug!(
        archive = %archive_path.display(),
        entries = manifest.total_entries,
        "archive listed"
    );
    Ok(manifest)
}
