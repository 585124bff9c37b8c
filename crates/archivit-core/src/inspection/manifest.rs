//! Archive manifest types.

use std::path::PathBuf;
use std::time::SystemTime;

use crate::extraction::EntryHeader;
use crate::format::FeatureFlags;
use crate::format::FormatVersion;
use crate::format::Header;
use crate::integrity::IntegrityMetadata;

/// Everything recorded about one entry, without its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// File name.
    pub name: String,

    /// Relative path exactly as stored, using the archive's separator.
    ///
    /// [`ArchiveEntry::host_path`] gives the form used on this host.
    pub path: String,

    /// Original size in bytes.
    pub size: u64,

    /// Stored size in bytes, excluding authentication tags.
    pub stored_size: u64,

    /// Whether the stored payload is compressed.
    pub compressed: bool,

    /// Owner may read.
    pub readable: bool,

    /// Owner may execute.
    pub executable: bool,

    /// Owner may write.
    pub writable: bool,

    /// Modification time in milliseconds since the Unix epoch.
    pub modified_millis: i64,

    /// Integrity record, if the archive carries them.
    pub integrity: Option<IntegrityMetadata>,
}

impl ArchiveEntry {
    pub(crate) fn from_header(entry: EntryHeader, stored_size: u64) -> Self {
        let EntryHeader {
            metadata,
            integrity,
            compressed,
        } = entry;
        Self {
            name: metadata.name,
            path: metadata.path,
            size: metadata.size,
            stored_size,
            compressed,
            readable: metadata.readable,
            executable: metadata.executable,
            writable: metadata.writable,
            modified_millis: metadata.modified_millis,
            integrity,
        }
    }

    /// Modification time, if representable on this platform.
    #[must_use]
    pub fn modified(&self) -> Option<SystemTime> {
        let offset = std::time::Duration::from_millis(self.modified_millis.unsigned_abs());
        if self.modified_millis >= 0 {
            SystemTime::UNIX_EPOCH.checked_add(offset)
        } else {
            SystemTime::UNIX_EPOCH.checked_sub(offset)
        }
    }

    /// Stored path split on `separator` and rebuilt with the host's
    /// separator.
    #[must_use]
    pub fn host_path(&self, separator: char) -> PathBuf {
        self.path
            .split(separator)
            .filter(|part| !part.is_empty())
            .collect()
    }

    /// Original size divided by stored size, 1.0 for empty entries.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compression_ratio(&self) -> f64 {
        if self.stored_size == 0 {
            return 1.0;
        }
        self.size as f64 / self.stored_size as f64
    }
}

/// The listing of an archive.
#[derive(Debug, Clone)]
pub struct ArchiveManifest {
    /// Container format version.
    pub version: FormatVersion,

    /// Container feature flags.
    pub flags: FeatureFlags,

    /// Separator used in stored paths.
    pub separator: char,

    /// Entries in archive order.
    pub entries: Vec<ArchiveEntry>,

    /// Number of entries.
    pub total_entries: usize,

    /// Sum of original sizes.
    pub total_size: u64,

    /// Sum of stored sizes.
    pub total_stored_size: u64,

    /// Size of the archive file.
    pub archive_size: u64,
}

impl ArchiveManifest {
    /// Creates an empty manifest for a parsed header.
    #[must_use]
    pub fn new(header: &Header, archive_size: u64) -> Self {
        Self {
            version: header.version,
            flags: header.flags,
            separator: header.separator_char(),
            entries: Vec::new(),
            total_entries: 0,
            total_size: 0,
            total_stored_size: 0,
            archive_size,
        }
    }

    /// Appends an entry and updates the totals.
    pub fn add_entry(&mut self, entry: ArchiveEntry) {
        self.total_entries += 1;
        self.total_size += entry.size;
        self.total_stored_size += entry.stored_size;
        self.entries.push(entry);
    }

    /// Whether entry contents are encrypted.
    #[must_use]
    pub const fn is_protected(&self) -> bool {
        self.flags.password()
    }
}
