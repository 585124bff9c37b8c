//! Directory tree enumeration for archive creation.
//!
//! The walker only classifies paths. Deciding what becomes an entry is the
//! writer's job, so any sequence of [`WalkEntry`] values can be archived.

use crate::ArchiveError;
use crate::Result;
use crate::creation::config::CreationConfig;
use crate::creation::filters;
use std::path::Path;
use std::path::PathBuf;
use walkdir::WalkDir;

/// What a walked path is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file, becomes an archive entry.
    File,
    /// Directory, implied by entry paths and never stored.
    Directory,
    /// Symbolic link, never followed or stored.
    Symlink,
    /// File skipped by the exclusion policy, or a special file.
    Excluded,
}

/// One classified path below the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Absolute or root-joined filesystem path.
    pub path: PathBuf,
    /// Classification of the path.
    pub kind: EntryKind,
}

/// Walks a source directory in a reproducible order.
///
/// Entries within a directory are sorted by file name, symlinks are not
/// followed and the root itself is not yielded.
///
/// # Examples
///
/// ```no_run
/// use archivit_core::creation::CreationConfig;
/// use archivit_core::creation::walker::EntryKind;
/// use archivit_core::creation::walker::FilteredWalker;
/// use std::path::Path;
///
/// let config = CreationConfig::default();
/// let walker = FilteredWalker::new(Path::new("./photos"), &config);
///
/// for entry in walker.walk() {
///     let entry = entry?;
///     if entry.kind == EntryKind::File {
///         println!("Would add: {}", entry.path.display());
///     }
/// }
/// # Ok::<(), archivit_core::ArchiveError>(())
/// ```
pub struct FilteredWalker<'a> {
    root: &'a Path,
    config: &'a CreationConfig,
}

impl<'a> FilteredWalker<'a> {
    /// Creates a walker rooted at `root`.
    #[must_use]
    pub const fn new(root: &'a Path, config: &'a CreationConfig) -> Self {
        Self { root, config }
    }

    /// Returns a lazy iterator over classified entries.
    ///
    /// # Errors
    ///
    /// Items are errors when a directory cannot be read.
    pub fn walk(&self) -> impl Iterator<Item = Result<WalkEntry>> + '_ {
        WalkDir::new(self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .map(move |entry| {
                let entry = entry.map_err(|e| {
                    ArchiveError::Io(std::io::Error::other(format!("walkdir error: {e}")))
                })?;
                let file_type = entry.file_type();

                let kind = if file_type.is_symlink() {
                    EntryKind::Symlink
                } else if file_type.is_dir() {
                    EntryKind::Directory
                } else if file_type.is_file()
                    && !filters::has_excluded_extension(
                        entry.path(),
                        &self.config.exclude_extensions,
                    )
                {
                    EntryKind::File
                } else {
                    EntryKind::Excluded
                };

                Ok(WalkEntry {
                    path: entry.into_path(),
                    kind,
                })
            })
    }
}

/// Counts the regular files below `root` without holding the walk.
///
/// Used to size progress before the real walk streams into the writer.
/// Unreadable directories are not counted here; the writing pass reports
/// them.
///
/// # Errors
///
/// Returns [`ArchiveError::SourceNotFound`] or
/// [`ArchiveError::SourceNotDirectory`] for a bad root.
pub fn count_files(root: &Path, config: &CreationConfig) -> Result<usize> {
    if !root.exists() {
        return Err(ArchiveError::SourceNotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(ArchiveError::SourceNotDirectory {
            path: root.to_path_buf(),
        });
    }

    Ok(FilteredWalker::new(root, config)
        .walk()
        .filter(|entry| matches!(entry, Ok(WalkEntry { kind: EntryKind::File, .. })))
        .count())
}
