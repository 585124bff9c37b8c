//! Error conversion utilities for CLI.
//!
//! Converts archivit-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance, and maps them back
//! to process exit codes.

use archivit_core::ArchiveError;
use archivit_core::crypto::Password;
use std::path::Path;

/// Exit code for any failure without a more specific code.
pub const EXIT_FAILURE: u8 = 1;

/// Exit code when the archive password does not match.
pub const EXIT_PASSWORD_MISMATCH: u8 = 2;

/// Exit code when a password is missing or malformed.
pub const EXIT_PASSWORD_INVALID: u8 = 3;

/// Converts an `ArchiveError` into an anyhow error with a hint.
///
/// The original error stays in the chain so [`exit_code`] can still find it.
pub fn convert_archive_error(err: ArchiveError, archive: &Path) -> anyhow::Error {
    let message = match &err {
        ArchiveError::PasswordRequired => format!(
            "'{}' is password-protected\n\
             HINT: Pass the password as the last argument.",
            archive.display()
        ),
        ArchiveError::PasswordMismatch => format!(
            "Incorrect password for '{}'\n\
             HINT: Passwords are case-sensitive. If the password is right, the archive was altered.",
            archive.display()
        ),
        ArchiveError::InvalidPassword { reason } => format!(
            "Invalid password: {reason}\n\
             HINT: Passwords must be 6 to 16 characters long."
        ),
        ArchiveError::SignatureMismatch => format!(
            "'{}' is not an archivit archive\n\
             HINT: Check the file name; archivit containers usually end in .archivit.",
            archive.display()
        ),
        ArchiveError::UnsupportedVersion { version } => format!(
            "'{}' uses format version {version}, which this build cannot read\n\
             HINT: Upgrade archivit.",
            archive.display()
        ),
        ArchiveError::PathTraversal { path } => format!(
            "Security violation: '{}' contains an entry escaping the destination: {}\n\
             HINT: This archive may be malicious. Do not extract from untrusted sources.",
            archive.display(),
            path.display()
        ),
        ArchiveError::IntegrityMismatch { path } => format!(
            "Integrity check failed for '{}' in '{}'\n\
             HINT: The archive is corrupted. Run 'archivit verify' to list every damaged entry.",
            path.display(),
            archive.display()
        ),
        ArchiveError::InvalidArchive(reason) => format!(
            "Invalid archive '{}': {reason}\n\
             HINT: The archive may be truncated or corrupted.",
            archive.display()
        ),
        ArchiveError::DestinationExists { path } => format!(
            "Destination already exists: {}\n\
             HINT: Choose another name or remove the existing file first.",
            path.display()
        ),
        ArchiveError::SourceNotFound { path } | ArchiveError::SourceNotDirectory { path } => {
            format!(
                "Cannot archive '{}': {err}\n\
                 HINT: The source must be an existing directory.",
                path.display()
            )
        }
        ArchiveError::SecurityViolation { reason } => format!(
            "Refused to extract from '{}': {reason}\n\
             HINT: Use --max-entry-size to raise the limit if the archive is trusted.",
            archive.display()
        ),
        _ => format!("Error processing archive '{}'", archive.display()),
    };
    anyhow::Error::new(err).context(message)
}

/// Adds context to a core result about archive operations.
pub fn add_archive_context<T>(
    result: Result<T, ArchiveError>,
    archive: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_archive_error(e, archive))
}

/// Parses a password argument, mapping format errors like the core does.
pub fn parse_password(value: Option<&str>) -> anyhow::Result<Option<Password>> {
    value
        .map(Password::new)
        .transpose()
        .map_err(|e| convert_archive_error(e, Path::new("-")))
}

/// Picks the process exit code for an error.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ArchiveError>() {
        Some(ArchiveError::PasswordMismatch) => EXIT_PASSWORD_MISMATCH,
        Some(ArchiveError::PasswordRequired | ArchiveError::InvalidPassword { .. }) => {
            EXIT_PASSWORD_INVALID
        }
        _ => EXIT_FAILURE,
    }
}
