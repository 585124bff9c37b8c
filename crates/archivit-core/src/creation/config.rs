//! Configuration for archive creation.

use crate::ArchiveError;
use crate::Result;
use crate::crypto::Password;
use crate::crypto::TAG_LEN;
use crate::format::DEFAULT_CHUNK_SIZE;
use crate::format::MAX_CHUNK_FRAME;

/// Options for creating an archive.
///
/// # Examples
///
/// ```
/// use archivit_core::creation::CreationConfig;
/// use archivit_core::crypto::Password;
///
/// let config = CreationConfig::default()
///     .with_password(Some(Password::new("secret1")?))
///     .with_compression(false)
///     .with_chunk_size(16 * 1024);
///
/// assert!(config.password.is_some());
/// assert!(config.integrity);
/// config.validate()?;
/// # Ok::<(), archivit_core::ArchiveError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CreationConfig {
    /// Encrypt every entry with a key derived from this password.
    ///
    /// Default: none
    pub password: Option<Password>,

    /// Try to compress entries.
    ///
    /// Default: `true`
    pub compression: bool,

    /// Store hash and checksum of every entry.
    ///
    /// Default: `true`
    pub integrity: bool,

    /// Stored bytes per encrypted chunk.
    ///
    /// Default: 64 KiB
    pub chunk_size: usize,

    /// File name suffixes that are never archived.
    ///
    /// Default: `.url`, `.URL`
    pub exclude_extensions: Vec<String>,

    /// Append `.archivit` to a destination that lacks it.
    ///
    /// Default: `false`
    pub append_extension: bool,
}

impl Default for CreationConfig {
    fn default() -> Self {
        Self {
            password: None,
            compression: true,
            integrity: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            exclude_extensions: vec![".url".to_string(), ".URL".to_string()],
            append_extension: false,
        }
    }
}

impl CreationConfig {
    /// Largest chunk size whose ciphertext still fits a reader's frame limit.
    #[allow(clippy::cast_possible_truncation)]
    pub const MAX_CHUNK_SIZE: usize = (MAX_CHUNK_FRAME as usize) - TAG_LEN;

    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the password.
    #[must_use]
    pub fn with_password(mut self, password: Option<Password>) -> Self {
        self.password = password;
        self
    }

    /// Enables or disables compression.
    #[must_use]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    /// Enables or disables integrity metadata.
    #[must_use]
    pub fn with_integrity(mut self, enabled: bool) -> Self {
        self.integrity = enabled;
        self
    }

    /// Sets the encrypted chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Replaces the excluded extensions.
    #[must_use]
    pub fn with_exclude_extensions(mut self, extensions: Vec<String>) -> Self {
        self.exclude_extensions = extensions;
        self
    }

    /// Enables or disables appending `.archivit` to the destination.
    #[must_use]
    pub fn with_append_extension(mut self, enabled: bool) -> Self {
        self.append_extension = enabled;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidConfiguration`] for a chunk size of
    /// zero or above [`Self::MAX_CHUNK_SIZE`], or an empty excluded
    /// extension.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > Self::MAX_CHUNK_SIZE {
            return Err(ArchiveError::InvalidConfiguration {
                reason: format!(
                    "chunk size must be between 1 and {} bytes, got {}",
                    Self::MAX_CHUNK_SIZE,
                    self.chunk_size
                ),
            });
        }

        if self.exclude_extensions.iter().any(String::is_empty) {
            return Err(ArchiveError::InvalidConfiguration {
                reason: "excluded extensions must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_config_default() {
        let config = CreationConfig::default();
        assert!(config.password.is_none());
        assert!(config.compression);
        assert!(config.integrity);
        assert_eq!(config.chunk_size, 64 * 1024);
        assert_eq!(config.exclude_extensions, vec![".url", ".URL"]);
        assert!(!config.append_extension);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_creation_config_builder() {
        let config = CreationConfig::new()
            .with_password(Some(Password::new("secret1").unwrap()))
            .with_compression(false)
            .with_integrity(false)
            .with_chunk_size(1024)
            .with_exclude_extensions(vec![".tmp".to_string()])
            .with_append_extension(true);

        assert!(config.password.is_some());
        assert!(!config.compression);
        assert!(!config.integrity);
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.exclude_extensions, vec![".tmp"]);
        assert!(config.append_extension);
    }

    #[test]
    fn test_creation_config_chunk_size_bounds() {
        let zero = CreationConfig::default().with_chunk_size(0);
        assert!(matches!(
            zero.validate(),
            Err(ArchiveError::InvalidConfiguration { .. })
        ));

        let max = CreationConfig::default().with_chunk_size(CreationConfig::MAX_CHUNK_SIZE);
        assert!(max.validate().is_ok());

        let over = CreationConfig::default().with_chunk_size(CreationConfig::MAX_CHUNK_SIZE + 1);
        assert!(over.validate().is_err());
    }

    #[test]
    fn test_creation_config_rejects_empty_extension() {
        let config = CreationConfig::default().with_exclude_extensions(vec![String::new()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let config =
            CreationConfig::default().with_password(Some(Password::new("hunter22").unwrap()));
        assert!(!format!("{config:?}").contains("hunter22"));
    }
}
