//! Configuration for archive extraction.

use crate::crypto::Password;

/// Options controlling how a container is unpacked.
///
/// # Examples
///
/// ```
/// use archivit_core::extraction::ExtractionConfig;
///
/// let config = ExtractionConfig::default()
///     .with_overwrite(false)
///     .with_max_entry_size(Some(10 * 1024 * 1024));
///
/// assert!(config.verify_integrity);
/// assert!(!config.overwrite);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Password for protected containers. Ignored for unprotected ones.
    pub password: Option<Password>,

    /// Replace files that already exist at an entry's target.
    ///
    /// When `false` the entry is skipped and a warning recorded.
    pub overwrite: bool,

    /// Check entries against their integrity records when present.
    pub verify_integrity: bool,

    /// Reject entries whose declared size exceeds this many bytes.
    pub max_entry_size: Option<u64>,

    /// Extract into a directory named after the archive file stem, created
    /// inside the destination.
    pub archive_subdirectory: bool,
}

impl Default for ExtractionConfig {
    /// Defaults:
    /// - no password
    /// - `overwrite`: true
    /// - `verify_integrity`: true
    /// - `max_entry_size`: unlimited
    /// - `archive_subdirectory`: false
    fn default() -> Self {
        Self {
            password: None,
            overwrite: true,
            verify_integrity: true,
            max_entry_size: None,
            archive_subdirectory: false,
        }
    }
}

impl ExtractionConfig {
    /// Sets the password.
    #[must_use]
    pub fn with_password(mut self, password: Option<Password>) -> Self {
        self.password = password;
        self
    }

    /// Sets whether existing files are replaced.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets whether integrity records are checked.
    #[must_use]
    pub fn with_verify_integrity(mut self, verify: bool) -> Self {
        self.verify_integrity = verify;
        self
    }

    /// Sets the largest accepted entry size.
    #[must_use]
    pub fn with_max_entry_size(mut self, max: Option<u64>) -> Self {
        self.max_entry_size = max;
        self
    }

    /// Sets whether entries land in a subdirectory named after the archive.
    #[must_use]
    pub fn with_archive_subdirectory(mut self, enabled: bool) -> Self {
        self.archive_subdirectory = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExtractionConfig::default();
        assert!(config.password.is_none());
        assert!(config.overwrite);
        assert!(config.verify_integrity);
        assert!(config.max_entry_size.is_none());
        assert!(!config.archive_subdirectory);
    }

    #[test]
    fn test_builders() {
        let config = ExtractionConfig::default()
            .with_overwrite(false)
            .with_verify_integrity(false)
            .with_max_entry_size(Some(1024))
            .with_archive_subdirectory(true);
        assert!(!config.overwrite);
        assert!(!config.verify_integrity);
        assert_eq!(config.max_entry_size, Some(1024));
        assert!(config.archive_subdirectory);
    }
}
