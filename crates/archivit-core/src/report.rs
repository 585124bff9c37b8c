//! Extraction reporting and progress callbacks.

use std::path::Path;
use std::time::Duration;

/// Statistics about one extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Number of files written.
    pub files_extracted: usize,

    /// Number of directories created, including the destination itself.
    pub directories_created: usize,

    /// Entries whose integrity metadata was checked.
    pub files_verified: usize,

    /// Original bytes written to disk.
    pub bytes_written: u64,

    /// Duration of the extraction.
    pub duration: Duration,

    /// Warnings generated during extraction.
    pub warnings: Vec<String>,
}

impl ExtractionReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a warning message to the report.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Files plus directories.
    #[must_use]
    pub const fn total_items(&self) -> usize {
        self.files_extracted + self.directories_created
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Receives progress events from long-running operations.
///
/// # Examples
///
/// ```
/// use archivit_core::ProgressCallback;
/// use std::path::Path;
///
/// struct Printer;
///
/// impl ProgressCallback for Printer {
///     fn on_entry_start(&mut self, path: &Path, total: usize, current: usize) {
///         println!("[{current}/{total}] {}", path.display());
///     }
///
///     fn on_bytes_written(&mut self, _bytes: u64) {}
///
///     fn on_entry_complete(&mut self, _path: &Path) {}
///
///     fn on_complete(&mut self) {
///         println!("done");
///     }
/// }
/// ```
pub trait ProgressCallback: Send {
    /// Called before an entry is processed. `total` is 0 when unknown.
    fn on_entry_start(&mut self, path: &Path, total: usize, current: usize);

    /// Called with the number of content bytes just processed.
    fn on_bytes_written(&mut self, bytes: u64);

    /// Called after an entry was processed.
    fn on_entry_complete(&mut self, path: &Path);

    /// Called once when the operation succeeded.
    fn on_complete(&mut self);
}

/// Progress callback that ignores every event.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_entry_start(&mut self, _path: &Path, _total: usize, _current: usize) {}

    fn on_bytes_written(&mut self, _bytes: u64) {}

    fn on_entry_complete(&mut self, _path: &Path) {}

    fn on_complete(&mut self) {}
}

/// Numbers entries for a [`ProgressCallback`].
pub(crate) struct ProgressTracker<'a> {
    progress: &'a mut dyn ProgressCallback,
    current: usize,
    total: usize,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(progress: &'a mut dyn ProgressCallback, total: usize) -> Self {
        Self {
            progress,
            current: 0,
            total,
        }
    }

    pub(crate) fn on_entry_start(&mut self, path: &Path) {
        self.current += 1;
        self.progress.on_entry_start(path, self.total, self.current);
    }

    pub(crate) fn on_bytes_written(&mut self, bytes: u64) {
        if bytes > 0 {
            self.progress.on_bytes_written(bytes);
        }
    }

    pub(crate) fn on_entry_complete(&mut self, path: &Path) {
        self.progress.on_entry_complete(path);
    }

    pub(crate) fn on_complete(&mut self) {
        self.progress.on_complete();
    }
}
