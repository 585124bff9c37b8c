//! Path sanitizer for stored entry paths.

use crate::ArchiveError;
use crate::Result;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use super::DestDir;

/// A relative entry path proven to stay inside a [`DestDir`].
///
/// `SafePath` can only be built through validation. There is no
/// `From<PathBuf>`.
///
/// # Examples
///
/// ```no_run
/// use archivit_core::types::DestDir;
/// use archivit_core::types::SafePath;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/tmp/restored")?;
///
/// let safe = SafePath::from_stored("docs/a.txt", '/', &dest)?;
/// assert!(safe.as_path().ends_with("a.txt"));
///
/// assert!(SafePath::from_stored("../../etc/passwd", '/', &dest).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafePath(PathBuf);

impl SafePath {
    /// Converts a stored path to a host path and validates it.
    ///
    /// `stored` is split on the archive's `separator` byte, so paths written
    /// on another platform resolve to the same components here.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::PathTraversal`] for a leading separator and
    /// anything [`SafePath::validate`] rejects.
    pub fn from_stored(stored: &str, separator: char, dest: &DestDir) -> Result<Self> {
        let normalized = Self::normalize_stored(stored, separator)?;
        Self::confine(normalized, dest)
    }

    /// Converts a stored path to a normalized relative host path without
    /// touching the filesystem.
    ///
    /// Catches every escape a path can express by itself; escapes through
    /// symlinks on disk need [`SafePath::from_stored`].
    ///
    /// # Errors
    ///
    /// Same as [`SafePath::from_stored`], minus the filesystem checks.
    pub fn normalize_stored(stored: &str, separator: char) -> Result<PathBuf> {
        if stored.starts_with(separator) {
            return Err(ArchiveError::PathTraversal {
                path: PathBuf::from(stored),
            });
        }

        let host: PathBuf = stored
            .split(separator)
            .filter(|part| !part.is_empty())
            .collect();
        normalize(&host)
    }

    /// Validates a relative path against `dest`.
    ///
    /// # Validation Steps
    ///
    /// 1. Reject null bytes
    /// 2. Reject `..`, root and prefix components
    /// 3. Drop `.` components
    /// 4. Check the resolved parent stays inside `dest` after symlinks are
    ///    resolved
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::SecurityViolation`] for null bytes
    /// - [`ArchiveError::PathTraversal`] for escaping or empty paths
    pub fn validate(path: &Path, dest: &DestDir) -> Result<Self> {
        Self::confine(normalize(path)?, dest)
    }

    fn confine(normalized: PathBuf, dest: &DestDir) -> Result<Self> {
        let path = normalized.as_path();
        let resolved = dest.as_path().join(&normalized);

        // An existing parent may be a symlink planted by an earlier entry.
        if let Some(parent) = resolved.parent() {
            match parent.canonicalize() {
                Ok(canonical_parent) => {
                    if !canonical_parent.starts_with(dest.as_path()) {
                        return Err(ArchiveError::PathTraversal {
                            path: path.to_path_buf(),
                        });
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(ArchiveError::Io(std::io::Error::new(
                        e.kind(),
                        format!("failed to canonicalize parent: {e}"),
                    )));
                }
            }
        }

        match resolved.canonicalize() {
            Ok(canonical) => {
                if !canonical.starts_with(dest.as_path()) {
                    return Err(ArchiveError::PathTraversal {
                        path: path.to_path_buf(),
                    });
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if !resolved.starts_with(dest.as_path()) {
                    return Err(ArchiveError::PathTraversal {
                        path: path.to_path_buf(),
                    });
                }
            }
            Err(e) => {
                return Err(ArchiveError::Io(std::io::Error::new(
                    e.kind(),
                    format!("failed to canonicalize path: {e}"),
                )));
            }
        }

        Ok(Self(normalized))
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

fn normalize(path: &Path) -> Result<PathBuf> {
    if has_null_bytes(path) {
        return Err(ArchiveError::SecurityViolation {
            reason: format!("path contains null bytes: {}", path.display()),
        });
    }

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ArchiveError::PathTraversal {
                    path: path.to_path_buf(),
                });
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(ArchiveError::PathTraversal {
            path: path.to_path_buf(),
        });
    }
    Ok(normalized)
}

#[cfg(unix)]
fn has_null_bytes(path: &Path) -> bool {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().contains(&b'\0')
}

#[cfg(not(unix))]
fn has_null_bytes(path: &Path) -> bool {
    path.to_str().is_none_or(|s| s.contains('\0'))
}
