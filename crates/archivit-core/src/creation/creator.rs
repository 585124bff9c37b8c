//! Archive creation from a directory tree.

use std::fs::File;
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::ArchiveError;
use crate::ProgressCallback;
use crate::Result;
use crate::creation::config::CreationConfig;
use crate::creation::filters;
use crate::creation::report::CreationReport;
use crate::creation::walker::FilteredWalker;
use crate::creation::walker::count_files;
use crate::creation::writer::ArchiveWriter;
use crate::crypto::Password;
use crate::io::DigestWriter;
use crate::io::PartialFileGuard;

/// Builder for creating archives with a fluent API.
///
/// # Examples
///
/// ```no_run
/// use archivit_core::creation::ArchiveCreator;
/// use archivit_core::crypto::Password;
///
/// let report = ArchiveCreator::new()
///     .source("photos/")
///     .output("photos.archivit")
///     .password(Password::new("secret1")?)
///     .create()?;
///
/// println!("Archived {} files", report.files_added);
/// # Ok::<(), archivit_core::ArchiveError>(())
/// ```
#[derive(Debug, Default)]
pub struct ArchiveCreator {
    source: Option<PathBuf>,
    output_path: Option<PathBuf>,
    config: CreationConfig,
}

impl ArchiveCreator {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory to archive.
    #[must_use]
    pub fn source<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the archive path.
    #[must_use]
    pub fn output<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: CreationConfig) -> Self {
        self.config = config;
        self
    }

    /// Encrypts entries with `password`.
    #[must_use]
    pub fn password(mut self, password: Password) -> Self {
        self.config.password = Some(password);
        self
    }

    /// Enables or disables compression.
    #[must_use]
    pub fn compression(mut self, enabled: bool) -> Self {
        self.config.compression = enabled;
        self
    }

    /// Enables or disables integrity metadata.
    #[must_use]
    pub fn integrity(mut self, enabled: bool) -> Self {
        self.config.integrity = enabled;
        self
    }

    /// Adds a file name suffix to exclude.
    #[must_use]
    pub fn exclude_extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.config.exclude_extensions.push(extension.into());
        self
    }

    /// Creates the archive.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidConfiguration`] if the source or
    /// output is missing, and any error from [`crate::create_archive`].
    pub fn create(self) -> Result<CreationReport> {
        let (source, output) = self.paths()?;
        crate::api::create_archive(&source, &output, &self.config)
    }

    /// Creates the archive, reporting progress.
    pub fn create_with_progress(self, progress: &mut dyn ProgressCallback) -> Result<CreationReport> {
        let (source, output) = self.paths()?;
        crate::api::create_archive_with_progress(&source, &output, &self.config, progress)
    }

    fn paths(&self) -> Result<(PathBuf, PathBuf)> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| ArchiveError::InvalidConfiguration {
                reason: "source directory not set".to_string(),
            })?;
        let output = self
            .output_path
            .clone()
            .ok_or_else(|| ArchiveError::InvalidConfiguration {
                reason: "output path not set".to_string(),
            })?;
        Ok((source, output))
    }
}

/// Validates inputs, writes the archive and fills the report.
pub(crate) fn create_with_progress(
    source: &Path,
    destination: &Path,
    config: &CreationConfig,
    progress: &mut dyn ProgressCallback,
) -> Result<CreationReport> {
    let start = Instant::now();
    config.validate()?;

    if !source.exists() {
        return Err(ArchiveError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }
    if !source.is_dir() {
        return Err(ArchiveError::SourceNotDirectory {
            path: source.to_path_buf(),
        });
    }

    let destination = if config.append_extension {
        filters::with_archive_extension(destination)
    } else {
        destination.to_path_buf()
    };
    if destination.symlink_metadata().is_ok() {
        return Err(ArchiveError::DestinationExists { path: destination });
    }

    let total_files = count_files(source, config)?;

    let file = open_new(&destination)?;
    let guard = PartialFileGuard::new(destination.clone());

    let mut writer = ArchiveWriter::new(BufWriter::new(DigestWriter::counting(file)), config)?;
    let walker = FilteredWalker::new(source, config);
    let mut report = writer.add_walk(walker.walk(), source, progress, total_files)?;

    let counting = writer
        .finish()?
        .into_inner()
        .map_err(|e| ArchiveError::Io(e.into_error()))?;
    report.archive_path.clone_from(&destination);
    report.archive_size = counting.total_bytes();
    let (file, _) = counting.into_parts();
    file.sync_all()?;
    drop(file);
    guard.disarm();

    report.duration = start.elapsed();
    info!(
        archive = %destination.display(),
        files = report.files_added,
        bytes = report.archive_size,
        "archive created"
    );
    Ok(report)
}

fn open_new(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                ArchiveError::DestinationExists {
                    path: path.to_path_buf(),
                }
            } else {
                ArchiveError::Io(e)
            }
        })
}
