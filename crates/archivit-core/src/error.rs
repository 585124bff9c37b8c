//! Error types for archive creation, listing and extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Broad classification of an [`ArchiveError`].
///
/// Callers use the category to decide how to react: validation errors are
/// reported before any I/O happens, authentication errors usually mean the
/// user should be asked for the password again, and format errors mean the
/// container itself cannot be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad input paths, malformed passwords or invalid configuration.
    Validation,
    /// The container is malformed, truncated or from an unknown version.
    Format,
    /// An AEAD tag did not verify; the password is wrong or data was altered.
    Authentication,
    /// A filesystem operation failed.
    Io,
    /// A stored path tried to escape the extraction root.
    Traversal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Format => "format",
            Self::Authentication => "authentication",
            Self::Io => "io",
            Self::Traversal => "traversal",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while working with archivit containers.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source directory for archive creation not found.
    #[error("source path not found: {path}")]
    SourceNotFound {
        /// The missing source path.
        path: PathBuf,
    },

    /// Source path exists but is not a directory.
    #[error("source path is not a directory: {path}")]
    SourceNotDirectory {
        /// The offending source path.
        path: PathBuf,
    },

    /// Archive destination already exists.
    #[error("destination already exists: {path}")]
    DestinationExists {
        /// The existing destination path.
        path: PathBuf,
    },

    /// A filesystem path cannot become an archive entry.
    #[error("invalid path {path}: {reason}")]
    InvalidPath {
        /// The rejected path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// Password does not satisfy the length rules.
    #[error("invalid password format: {reason}")]
    InvalidPassword {
        /// Which rule was violated.
        reason: String,
    },

    /// Archive is password-protected but no password was supplied.
    #[error("archive is password-protected but no password was provided")]
    PasswordRequired,

    /// AEAD authentication failed while decrypting a chunk.
    #[error("password does not match")]
    PasswordMismatch,

    /// File does not start with a known archivit signature.
    #[error("not an archivit container: signature mismatch")]
    SignatureMismatch,

    /// Container declares a version this build cannot read.
    #[error("unsupported archive version: {version}")]
    UnsupportedVersion {
        /// The version byte found in the header.
        version: u8,
    },

    /// Archive is corrupted or invalid.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// Stored bytes do not match their integrity metadata.
    #[error("integrity check failed for {path}")]
    IntegrityMismatch {
        /// Stored path of the corrupted entry.
        path: PathBuf,
    },

    /// Path traversal attempt detected.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The path that attempted traversal.
        path: PathBuf,
    },

    /// Operation not permitted by path policy.
    #[error("operation denied by security policy: {reason}")]
    SecurityViolation {
        /// Reason for the violation.
        reason: String,
    },

    /// A length does not fit in its length prefix.
    #[error("segment too large: {len} bytes (maximum {max})")]
    SegmentTooLarge {
        /// Length that was requested.
        len: u64,
        /// Largest length the prefix or limit allows.
        max: u64,
    },

    /// Cipher could not be initialized.
    #[error("cipher error: {0}")]
    Crypto(String),

    /// Configuration is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What is wrong with the configuration.
        reason: String,
    },
}

impl ArchiveError {
    /// Returns the broad category of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use archivit_core::ArchiveError;
    /// use archivit_core::ErrorCategory;
    ///
    /// assert_eq!(
    ///     ArchiveError::PasswordMismatch.category(),
    ///     ErrorCategory::Authentication
    /// );
    /// assert_eq!(
    ///     ArchiveError::SignatureMismatch.category(),
    ///     ErrorCategory::Format
    /// );
    /// ```
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::SourceNotFound { .. }
            | Self::SourceNotDirectory { .. }
            | Self::DestinationExists { .. }
            | Self::InvalidPath { .. }
            | Self::InvalidPassword { .. }
            | Self::PasswordRequired
            | Self::InvalidConfiguration { .. } => ErrorCategory::Validation,
            Self::SignatureMismatch
            | Self::UnsupportedVersion { .. }
            | Self::InvalidArchive(_)
            | Self::IntegrityMismatch { .. }
            | Self::SegmentTooLarge { .. }
            | Self::Crypto(_) => ErrorCategory::Format,
            Self::PasswordMismatch => ErrorCategory::Authentication,
            Self::Io(_) => ErrorCategory::Io,
            Self::PathTraversal { .. } | Self::SecurityViolation { .. } => {
                ErrorCategory::Traversal
            }
        }
    }

    /// Returns `true` if this error represents a security violation.
    ///
    /// # Examples
    ///
    /// ```
    /// use archivit_core::ArchiveError;
    /// use std::path::PathBuf;
    ///
    /// let err = ArchiveError::PathTraversal {
    ///     path: PathBuf::from("../etc/passwd"),
    /// };
    /// assert!(err.is_security_violation());
    /// assert!(!ArchiveError::PasswordRequired.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self.category(), ErrorCategory::Traversal)
    }

    /// Returns `true` if asking for a different password could help.
    #[must_use]
    pub const fn is_password_error(&self) -> bool {
        matches!(
            self,
            Self::PasswordMismatch | Self::PasswordRequired | Self::InvalidPassword { .. }
        )
    }

    /// Returns a context string for this error, if available.
    ///
    /// # Examples
    ///
    /// ```
    /// use archivit_core::ArchiveError;
    ///
    /// let err = ArchiveError::InvalidArchive("bad header".to_string());
    /// assert_eq!(err.context(), Some("bad header"));
    /// assert_eq!(ArchiveError::SignatureMismatch.context(), None);
    /// ```
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::InvalidArchive(msg) | Self::Crypto(msg) => Some(msg),
            Self::InvalidPath { reason, .. }
            | Self::InvalidPassword { reason }
            | Self::SecurityViolation { reason }
            | Self::InvalidConfiguration { reason } => Some(reason),
            _ => None,
        }
    }

    /// Maps a premature end of input to a format error.
    ///
    /// Every other I/O error is kept as [`ArchiveError::Io`].
    pub(crate) fn from_read(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::InvalidArchive("unexpected end of archive".to_string())
        } else {
            Self::Io(err)
        }
    }
}
