//! Path filtering for archive creation.

use std::path::Path;
use std::path::PathBuf;

use crate::format::EXTENSION;

/// Returns `true` if the file name ends with one of `extensions`.
///
/// The comparison is case-sensitive, so both `.url` and `.URL` appear in
/// the default list.
///
/// # Examples
///
/// ```
/// use archivit_core::creation::filters;
/// use std::path::Path;
///
/// let excluded = [".url".to_string()];
/// assert!(filters::has_excluded_extension(Path::new("dir/link.url"), &excluded));
/// assert!(!filters::has_excluded_extension(Path::new("dir/link.URL"), &excluded));
/// assert!(!filters::has_excluded_extension(Path::new("notes.txt"), &excluded));
/// ```
#[must_use]
pub fn has_excluded_extension(path: &Path, extensions: &[String]) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| extensions.iter().any(|ext| name.ends_with(ext.as_str())))
}

/// Returns `path` with `.archivit` appended unless it already ends with it.
///
/// # Examples
///
/// ```
/// use archivit_core::creation::filters;
/// use std::path::Path;
///
/// assert_eq!(
///     filters::with_archive_extension(Path::new("backup")),
///     Path::new("backup.archivit")
/// );
/// assert_eq!(
///     filters::with_archive_extension(Path::new("backup.archivit")),
///     Path::new("backup.archivit")
/// );
/// ```
#[must_use]
pub fn with_archive_extension(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == EXTENSION) {
        return path.to_path_buf();
    }

    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(EXTENSION);
    PathBuf::from(name)
}
