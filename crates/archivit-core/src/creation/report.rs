//! Archive creation reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Statistics about one archive creation.
///
/// # Examples
///
/// ```
/// use archivit_core::creation::CreationReport;
///
/// let mut report = CreationReport::default();
/// report.bytes_read = 1000;
/// report.bytes_stored = 250;
///
/// assert_eq!(report.compression_ratio(), 4.0);
/// assert_eq!(report.compression_percentage(), 75.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CreationReport {
    /// Final archive path, after any extension was appended.
    pub archive_path: PathBuf,

    /// Regular files written as entries.
    pub files_added: usize,

    /// Directories walked. They are implied by entry paths, not stored.
    pub directories_seen: usize,

    /// Symbolic links skipped.
    pub symlinks_skipped: usize,

    /// Files skipped by the exclusion policy.
    pub files_excluded: usize,

    /// Entries stored compressed.
    pub files_compressed: usize,

    /// Original bytes of all entries.
    pub bytes_read: u64,

    /// Stored bytes of all entries, before encryption framing.
    pub bytes_stored: u64,

    /// Size of the finished archive file.
    pub archive_size: u64,

    /// Duration of the creation.
    pub duration: Duration,

    /// Warnings generated during creation.
    pub warnings: Vec<String>,
}

impl CreationReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a warning message to the report.
    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Original size divided by stored size.
    ///
    /// Returns 0.0 if either is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compression_ratio(&self) -> f64 {
        if self.bytes_stored == 0 || self.bytes_read == 0 {
            return 0.0;
        }
        self.bytes_read as f64 / self.bytes_stored as f64
    }

    /// Share of the original size saved by compression, in percent.
    ///
    /// Returns 0.0 for an empty archive and never goes negative.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compression_percentage(&self) -> f64 {
        if self.bytes_read == 0 {
            return 0.0;
        }
        let saved = self.bytes_read.saturating_sub(self.bytes_stored);
        (saved as f64 / self.bytes_read as f64) * 100.0
    }

    /// Every path the walker classified.
    #[must_use]
    pub const fn total_items(&self) -> usize {
        self.files_added + self.directories_seen + self.symlinks_skipped + self.files_excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_report_default() {
        let report = CreationReport::default();
        assert_eq!(report.files_added, 0);
        assert_eq!(report.bytes_read, 0);
        assert_eq!(report.archive_size, 0);
        assert_eq!(report.duration, Duration::default());
        assert!(!report.has_warnings());
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_compression_ratio() {
        let mut report = CreationReport::new();
        report.bytes_read = 1000;
        report.bytes_stored = 500;
        assert_eq!(report.compression_ratio(), 2.0);

        report.bytes_stored = 1000;
        assert_eq!(report.compression_ratio(), 1.0);

        report.bytes_stored = 0;
        assert_eq!(report.compression_ratio(), 0.0);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_compression_percentage() {
        let mut report = CreationReport::new();
        report.bytes_read = 1000;
        report.bytes_stored = 250;
        assert_eq!(report.compression_percentage(), 75.0);

        report.bytes_stored = 1000;
        assert_eq!(report.compression_percentage(), 0.0);

        // empty files only
        report.bytes_read = 0;
        report.bytes_stored = 0;
        assert_eq!(report.compression_percentage(), 0.0);
    }

    #[test]
    fn test_total_items() {
        let report = CreationReport {
            files_added: 3,
            directories_seen: 2,
            symlinks_skipped: 1,
            files_excluded: 1,
            ..CreationReport::default()
        };
        assert_eq!(report.total_items(), 7);
    }

    #[test]
    fn test_warnings() {
        let mut report = CreationReport::new();
        report.add_warning("skipped symlink: a -> b");
        assert!(report.has_warnings());
        assert_eq!(report.warnings.len(), 1);
    }
}
