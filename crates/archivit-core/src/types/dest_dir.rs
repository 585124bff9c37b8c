//! Validated extraction root.

use crate::ArchiveError;
use crate::Result;
use std::path::Path;
use std::path::PathBuf;

use super::SafePath;

/// Canonical, existing directory that extracted entries are confined to.
///
/// A destination that does not exist yet is created, so callers can pass a
/// fresh output directory. Once constructed the path is absolute and has
/// all symlinks resolved, which is what [`SafePath`] compares against.
///
/// # Examples
///
/// ```no_run
/// use archivit_core::types::DestDir;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/tmp/restored")?;
/// println!("Extracting to: {}", dest.as_path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestDir(PathBuf);

impl DestDir {
    /// Creates the directory if needed and canonicalizes it.
    ///
    /// The window between creation and canonicalization is not guarded;
    /// every joined path is checked again by [`SafePath::validate`].
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::InvalidPath`] if the path exists but is not a
    ///   directory
    /// - [`ArchiveError::Io`] if the directory cannot be created or resolved
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if path.exists() {
            if !path.is_dir() {
                return Err(ArchiveError::InvalidPath {
                    path,
                    reason: "destination is not a directory".to_string(),
                });
            }
        } else {
            std::fs::create_dir_all(&path)?;
        }

        let canonical = path.canonicalize().map_err(|e| {
            ArchiveError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to canonicalize path {}: {e}", path.display()),
            ))
        })?;

        Ok(Self(canonical))
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Joins a validated entry path to this destination.
    #[inline]
    #[must_use]
    pub fn join(&self, safe_path: &SafePath) -> PathBuf {
        self.0.join(safe_path.as_path())
    }

    /// Returns a destination one directory below this one.
    ///
    /// `name` must be a single normal component.
    pub fn subdirectory(&self, name: &str) -> Result<Self> {
        let component = Path::new(name);
        let mut components = component.components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(_)), None) => Self::new(self.0.join(component)),
            _ => Err(ArchiveError::InvalidPath {
                path: component.to_path_buf(),
                reason: "not a single directory name".to_string(),
            }),
        }
    }
}
